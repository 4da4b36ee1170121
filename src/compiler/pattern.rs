//! 编译后模式模型
//! 正则编译后的结构

use std::collections::HashMap;
use std::fmt;
use regex::Regex;

/// 证据通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Url,
    Html,
    Headers,
    Cookies,
    Scripts,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Url => "url",
            Channel::Html => "html",
            Channel::Headers => "headers",
            Channel::Cookies => "cookies",
            Channel::Scripts => "scripts",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 编译后的单条规则
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// 编译前的匹配表达式，仅用于诊断
    pub raw_text: String,
    /// 为 None 时表示仅判断 Header/Cookie 是否存在
    pub regex: Option<Regex>,
    pub version_template: String,
    /// 保留字段，不参与匹配判断
    pub confidence: Option<u8>,
}

impl CompiledPattern {
    /// 规则描述
    pub fn describe(&self) -> &str {
        match &self.regex {
            Some(regex) => regex.as_str(),
            None => "exists",
        }
    }

    pub fn is_exists(&self) -> bool {
        self.regex.is_none()
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.as_ref().is_some_and(|regex| regex.is_match(input))
    }
}

/// 通道键 -> 规则列表
pub type PatternSet = HashMap<String, Vec<CompiledPattern>>;

/// 技术编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledTechRule {
    pub name: String,
    pub category_ids: Vec<u32>,
    pub categories: Vec<String>,
    pub url_patterns: PatternSet,
    pub html_patterns: Option<PatternSet>,
    pub header_patterns: Option<PatternSet>,
    pub cookie_patterns: Option<PatternSet>,
    pub script_patterns: Option<PatternSet>,
    pub implies: Vec<String>,
    pub excludes: Vec<String>,
}

impl CompiledTechRule {
    /// 按通道取规则集
    pub fn patterns(&self, channel: Channel) -> Option<&PatternSet> {
        match channel {
            Channel::Url => Some(&self.url_patterns),
            Channel::Html => self.html_patterns.as_ref(),
            Channel::Headers => self.header_patterns.as_ref(),
            Channel::Cookies => self.cookie_patterns.as_ref(),
            Channel::Scripts => self.script_patterns.as_ref(),
        }
    }
}

/// 编译后的指纹库，加载完成后只读
/// 分类名称在编译时已写入各技术规则，不再单独保留分类表
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleLibrary {
    pub tech_patterns: HashMap<String, CompiledTechRule>,
}

impl CompiledRuleLibrary {
    pub fn lookup(&self, app_name: &str, channel: Channel) -> Option<&PatternSet> {
        self.tech_patterns.get(app_name)?.patterns(channel)
    }

    pub fn len(&self) -> usize {
        self.tech_patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tech_patterns.is_empty()
    }
}
