//! 版本提取工具模块
//! 根据规则中的版本模板，从正则捕获结果中拼出版本号
//! 模板支持 `\1` 反向引用以及 `\1?真:假` 三元写法

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::compiler::CompiledPattern;

/// `\N` 反向引用
static BACKREFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(\d+)").unwrap());

/// `\N?真:假`，假分支一直延伸到模板末尾
static TERNARY_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\(\d+)\?([^:]*):(.*)").unwrap());

/// 版本提取工具类
pub struct VersionExtractor;

impl VersionExtractor {
    /// 对已命中的输入重新做全局捕获，按模板生成版本号
    ///
    /// 每次出现、每个分组依次处理：先求值该分组的三元写法，再替换该分组的反向引用。
    /// 全部处理完后，仍残留的三元写法取假分支，残留的反向引用替换为空串。
    /// 无模板、无正则或未命中时返回空串。
    pub fn extract(pattern: &CompiledPattern, input: &str) -> String {
        let Some(regex) = &pattern.regex else {
            return String::new();
        };
        if pattern.version_template.is_empty() {
            return String::new();
        }

        let mut version = pattern.version_template.clone();
        let mut matched = false;

        for captures in regex.captures_iter(input) {
            matched = true;
            for index in 0..captures.len() {
                let value = captures.get(index).map(|m| m.as_str()).unwrap_or("");
                version = Self::resolve_ternary(&version, |i| (i == index).then(|| !value.is_empty()));
                version = Self::resolve_backreference(&version, |i| (i == index).then_some(value));
            }
        }

        if !matched {
            return String::new();
        }

        // 未参与匹配或不存在的分组
        version = Self::resolve_ternary(&version, |_| Some(false));
        version = Self::resolve_backreference(&version, |_| Some(""));
        version.trim().to_string()
    }

    /// `truthy` 返回 None 表示该分组不在本轮处理范围内
    fn resolve_ternary<F>(template: &str, truthy: F) -> String
    where
        F: Fn(usize) -> Option<bool>,
    {
        TERNARY_REGEX
            .replace_all(template, |caps: &Captures| {
                let decision = caps[1].parse::<usize>().ok().and_then(&truthy);
                match decision {
                    Some(true) => caps[2].to_string(),
                    Some(false) => caps[3].to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn resolve_backreference<'a, F>(template: &str, value: F) -> String
    where
        F: Fn(usize) -> Option<&'a str>,
    {
        BACKREFERENCE_REGEX
            .replace_all(template, |caps: &Captures| {
                match caps[1].parse::<usize>().ok().and_then(&value) {
                    Some(v) => v.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
