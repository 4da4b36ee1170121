//! 检测分析器：URL/Header/HTML/Cookie/Script 五个证据通道
use std::collections::HashMap;
use tracing::debug;

use crate::compiler::{Channel, CompiledPattern, CompiledRuleLibrary, CompiledTechRule, PatternSet};
use crate::utils::{DetectionSet, DetectionUpdater, HeaderValues, VersionExtractor};

/// 所有分析器的通用抽象特质
/// D-当前通道的数据源类型（支持 str/[T] 等动态大小类型）
pub trait Analyzer<D: ?Sized> {
    /// 分析器对应的通道，同时用于日志输出
    const CHANNEL: Channel;

    /// 单个技术在当前通道上的匹配逻辑
    fn match_logic(
        tech: &CompiledTechRule,
        patterns: &PatternSet,
        data: &D,
        detected: &mut DetectionSet,
    );

    /// 通用分析执行骨架：遍历技术 → 取通道规则 → 调用匹配逻辑
    fn analyze(compiled_lib: &CompiledRuleLibrary, data: &D, detected: &mut DetectionSet)
    where
        Self: Sized,
    {
        for tech in compiled_lib.tech_patterns.values() {
            let Some(patterns) = tech.patterns(Self::CHANNEL) else {
                continue;
            };
            if patterns.is_empty() {
                continue;
            }
            Self::match_logic(tech, patterns, data, detected);
        }
    }
}

/// 匹配成功通用处理器：登记命中并按模板刷新版本
fn handle_match_success(
    channel: Channel,
    tech: &CompiledTechRule,
    target_key: &str,
    pattern: &CompiledPattern,
    input: &str,
    detected: &mut DetectionSet,
) {
    let version = VersionExtractor::extract(pattern, input);
    debug!(
        "[{}]匹配成功 | 技术: {} | 匹配项: {} | 版本: {:?} | 规则: {}",
        channel, tech.name, target_key, version, pattern.describe()
    );
    let detection = DetectionUpdater::register(detected, tech);
    DetectionUpdater::refine_version(detection, version);
}

/// 存在性匹配成功处理器
fn handle_exists_success(
    channel: Channel,
    tech: &CompiledTechRule,
    target_key: &str,
    detected: &mut DetectionSet,
) {
    debug!(
        "[{}]存在性匹配成功 | 技术: {} | 匹配项: {}",
        channel, tech.name, target_key
    );
    DetectionUpdater::register(detected, tech);
}

/// 单一输入通道（URL/HTML）共用逻辑，无正则的规则永不命中
fn match_single_input(
    channel: Channel,
    tech: &CompiledTechRule,
    patterns: &PatternSet,
    input: &str,
    detected: &mut DetectionSet,
) {
    for (key, key_patterns) in patterns {
        for pattern in key_patterns {
            if pattern.is_match(input) {
                handle_match_success(channel, tech, key, pattern, input, detected);
            }
        }
    }
}

// URL 分析器
pub struct UrlAnalyzer;

impl Analyzer<str> for UrlAnalyzer {
    const CHANNEL: Channel = Channel::Url;

    fn match_logic(tech: &CompiledTechRule, patterns: &PatternSet, url: &str, detected: &mut DetectionSet) {
        match_single_input(Self::CHANNEL, tech, patterns, url, detected);
    }
}

// HTML 分析器
pub struct HtmlAnalyzer;

impl Analyzer<str> for HtmlAnalyzer {
    const CHANNEL: Channel = Channel::Html;

    fn match_logic(tech: &CompiledTechRule, patterns: &PatternSet, html: &str, detected: &mut DetectionSet) {
        match_single_input(Self::CHANNEL, tech, patterns, html, detected);
    }
}

// Header 分析器
pub struct HeaderAnalyzer;

impl Analyzer<HeaderValues> for HeaderAnalyzer {
    const CHANNEL: Channel = Channel::Headers;

    fn match_logic(
        tech: &CompiledTechRule,
        header_patterns: &PatternSet,
        headers: &HeaderValues,
        detected: &mut DetectionSet,
    ) {
        for (header_name, patterns) in header_patterns {
            let Some(values) = headers.get(&header_name.to_lowercase()) else {
                continue;
            };

            for pattern in patterns {
                if pattern.is_exists() {
                    handle_exists_success(Self::CHANNEL, tech, header_name, detected);
                    continue;
                }
                // 同名Header可能出现多次，取第一个命中的值
                if let Some(value) = values.iter().find(|value| pattern.is_match(value)) {
                    handle_match_success(Self::CHANNEL, tech, header_name, pattern, value, detected);
                }
            }
        }
    }
}

// Cookie 分析器
pub struct CookieAnalyzer;

impl Analyzer<HashMap<String, String>> for CookieAnalyzer {
    const CHANNEL: Channel = Channel::Cookies;

    fn match_logic(
        tech: &CompiledTechRule,
        cookie_patterns: &PatternSet,
        cookies: &HashMap<String, String>,
        detected: &mut DetectionSet,
    ) {
        for (cookie_name, patterns) in cookie_patterns {
            let Some(cookie_value) = cookies.get(&cookie_name.to_lowercase()) else {
                continue;
            };

            for pattern in patterns {
                if pattern.is_exists() {
                    handle_exists_success(Self::CHANNEL, tech, cookie_name, detected);
                } else if pattern.is_match(cookie_value) {
                    handle_match_success(Self::CHANNEL, tech, cookie_name, pattern, cookie_value, detected);
                }
            }
        }
    }
}

// Script 分析器
pub struct ScriptAnalyzer;

impl Analyzer<[String]> for ScriptAnalyzer {
    const CHANNEL: Channel = Channel::Scripts;

    fn match_logic(
        tech: &CompiledTechRule,
        script_patterns: &PatternSet,
        script_srcs: &[String],
        detected: &mut DetectionSet,
    ) {
        for (key, patterns) in script_patterns {
            for pattern in patterns {
                // 每条规则只取第一个命中的script
                if let Some(src) = script_srcs.iter().find(|src| pattern.is_match(src)) {
                    handle_match_success(Self::CHANNEL, tech, key, pattern, src, detected);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleCompiler;
    use crate::rule::RuleLoader;
    use crate::utils::HeaderConverter;
    use serde_json::json;

    fn library(apps: serde_json::Value) -> CompiledRuleLibrary {
        let value = json!({"apps": apps, "categories": {"1": {"name": "CMS", "priority": 1}}});
        RuleCompiler::compile(&RuleLoader::from_json_str(&value.to_string()).unwrap()).unwrap()
    }

    #[test]
    fn test_url_analyzer() {
        let lib = library(json!({
            "Shopify": {"cats": [], "url": "^https?//.+\\.myshopify\\.com"},
            "GitHub Pages": {"cats": [], "url": ["^https?://[^/]+\\.github\\.io"]},
            "NoUrl": {"cats": []}
        }));
        let mut detected = DetectionSet::new();
        UrlAnalyzer::analyze(&lib, "https://octo.github.io/page", &mut detected);

        assert_eq!(detected.len(), 1);
        assert!(detected.contains_key("GitHub Pages"));
    }

    #[test]
    fn test_header_analyzer_presence_and_regex() {
        let lib = library(json!({
            "Varnish": {"cats": [], "headers": {"X-Varnish": ""}},
            "Nginx": {"cats": [], "headers": {"Server": "nginx(?:/([\\d.]+))?\\;version:\\1"}},
            "Apache": {"cats": [], "headers": {"Server": "apache"}}
        }));
        let headers = HeaderConverter::from_raw(
            "X-Varnish: 12345\nServer: cloudflare\nServer: nginx/1.21.6\nServer: nginx/1.19.0\n",
        );
        let mut detected = DetectionSet::new();
        HeaderAnalyzer::analyze(&lib, &headers, &mut detected);

        assert_eq!(detected.len(), 2);
        assert_eq!(detected["Varnish"].version, "");
        assert_eq!(detected["Nginx"].version, "1.21.6");
    }

    #[test]
    fn test_cookie_analyzer() {
        let lib = library(json!({
            "PHP": {"cats": [], "cookies": {"PHPSESSID": ""}},
            "CodeIgniter": {"cats": [], "cookies": {"ci_csrf_token": "^(.+)$\\;version:\\1?2+:"}},
            "Laravel": {"cats": [], "cookies": {"laravel_session": ""}}
        }));
        let headers = HeaderConverter::from_raw(
            "Set-Cookie: PHPSESSID=abc; path=/\nSet-Cookie: ci_csrf_token=deadbeef\n",
        );
        let cookies = HeaderConverter::parse_cookies(&headers);
        let mut detected = DetectionSet::new();
        CookieAnalyzer::analyze(&lib, &cookies, &mut detected);

        assert_eq!(detected.len(), 2);
        assert!(detected.contains_key("PHP"));
        assert_eq!(detected["CodeIgniter"].version, "2+");
    }

    #[test]
    fn test_script_analyzer_first_script_wins() {
        let lib = library(json!({
            "jQuery": {"cats": [], "scripts": [
                "jquery[.-]([\\d.]*\\d)[^/]*\\.js\\;version:\\1",
                "jquery.*\\.js(?:\\?ver(?:sion)?=([\\d.]+))?\\;version:\\1"
            ]}
        }));
        let scripts = vec![
            "/static/app.js".to_string(),
            "/js/jquery-1.9.1.min.js".to_string(),
            "/js/jquery-3.6.0.min.js".to_string(),
        ];
        let mut detected = DetectionSet::new();
        ScriptAnalyzer::analyze(&lib, scripts.as_slice(), &mut detected);

        assert_eq!(detected.len(), 1);
        assert_eq!(detected["jQuery"].version, "1.9.1");
    }

    #[test]
    fn test_html_analyzer_refines_version_across_patterns() {
        let lib = library(json!({
            "Bootstrap": {"cats": [], "html": [
                "bootstrap-([\\d.]+)\\.css\\;version:\\1",
                "bootstrap\\.min\\.css\\?ver=([\\d.]+)\\;version:\\1"
            ]}
        }));
        let html = r#"<link href="/bootstrap-1.10.css"><link href="/bootstrap.min.css?ver=1.2">"#;
        let mut detected = DetectionSet::new();
        HtmlAnalyzer::analyze(&lib, html, &mut detected);

        assert_eq!(detected.len(), 1);
        assert_eq!(detected["Bootstrap"].version, "1.2");
    }
}
