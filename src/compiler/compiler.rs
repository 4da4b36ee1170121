//! 规则编译器核心
//! 将指纹库中的规则小语言编译为可执行的正则模式

use std::collections::HashMap;
use std::time::Instant;
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

use super::pattern::{Channel, CompiledPattern, CompiledRuleLibrary, CompiledTechRule, PatternSet};
use crate::error::{GowapError, GowapResult};
use crate::rule::{CategoryRule, RawApp, RawFingerprintDb, RawPatternField};

/// 规则片段分隔符
const SEGMENT_SEPARATOR: &str = "\\;";

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译指纹库，分类ID缺失时整体失败
    pub fn compile(db: &RawFingerprintDb) -> GowapResult<CompiledRuleLibrary> {
        let start = Instant::now();
        let mut stats = CompileStats::default();
        let mut tech_patterns = HashMap::with_capacity(db.apps.len());

        for (tech_name, raw_app) in &db.apps {
            let compiled = Self::compile_tech_rule(tech_name, raw_app, &db.categories, &mut stats)?;
            tech_patterns.insert(tech_name.clone(), compiled);
        }

        debug!("✅ 指纹库编译完成，总耗时{:?}，技术数{}", start.elapsed(), tech_patterns.len());
        debug!(
            "📊 编译统计：URL模式{}条、HTML模式{}条、Header模式{}条、Cookie模式{}条、Script模式{}条",
            stats.count(Channel::Url),
            stats.count(Channel::Html),
            stats.count(Channel::Headers),
            stats.count(Channel::Cookies),
            stats.count(Channel::Scripts),
        );
        if stats.degraded > 0 {
            warn!("{}条规则正则编译失败，已降级为无正则规则", stats.degraded);
        }

        Ok(CompiledRuleLibrary { tech_patterns })
    }

    /// 编译单个技术规则
    fn compile_tech_rule(
        tech_name: &str,
        raw_app: &RawApp,
        categories: &HashMap<String, CategoryRule>,
        stats: &mut CompileStats,
    ) -> GowapResult<CompiledTechRule> {
        let category_names = Self::resolve_categories(tech_name, &raw_app.category_ids, categories)?;

        // url 总是编译，其余通道仅在定义时编译
        let mut compile = |channel: Channel, field: Option<&RawPatternField>| -> PatternSet {
            Self::compile_field(tech_name, channel, field, stats)
        };
        let url_patterns = compile(Channel::Url, raw_app.url.as_ref());
        let html_patterns = raw_app.html.as_ref().map(|f| compile(Channel::Html, Some(f)));
        let header_patterns = raw_app.headers.as_ref().map(|f| compile(Channel::Headers, Some(f)));
        let cookie_patterns = raw_app.cookies.as_ref().map(|f| compile(Channel::Cookies, Some(f)));
        let script_patterns = raw_app.scripts.as_ref().map(|f| compile(Channel::Scripts, Some(f)));

        Ok(CompiledTechRule {
            name: tech_name.to_string(),
            category_ids: raw_app.category_ids.clone(),
            categories: category_names,
            url_patterns,
            html_patterns,
            header_patterns,
            cookie_patterns,
            script_patterns,
            implies: raw_app.implies.clone(),
            excludes: raw_app.excludes.clone(),
        })
    }

    /// 分类ID转分类名称
    fn resolve_categories(
        tech_name: &str,
        category_ids: &[u32],
        categories: &HashMap<String, CategoryRule>,
    ) -> GowapResult<Vec<String>> {
        category_ids
            .iter()
            .map(|id| {
                categories
                    .get(&id.to_string())
                    .map(|category| category.name.clone())
                    .ok_or_else(|| GowapError::UnknownCategory {
                        app: tech_name.to_string(),
                        id: *id,
                    })
            })
            .collect()
    }

    /// 编译一个通道字段
    fn compile_field(
        tech_name: &str,
        channel: Channel,
        field: Option<&RawPatternField>,
        stats: &mut CompileStats,
    ) -> PatternSet {
        let Some(field) = field else {
            return PatternSet::new();
        };

        let mut pattern_set = PatternSet::new();
        for (key, raw_patterns) in field.normalize() {
            let compiled: Vec<CompiledPattern> = raw_patterns
                .iter()
                .map(|raw| {
                    let (pattern, err) = Self::compile_single_pattern(raw);
                    if let Some(err) = err {
                        debug!(
                            "正则编译失败已降级：技术={}，通道={}，键={}，规则={}，错误={}",
                            tech_name, channel, key, pattern.raw_text, err
                        );
                        stats.degraded += 1;
                    }
                    pattern
                })
                .collect();
            *stats.counts.entry(channel).or_default() += compiled.len();
            pattern_set.insert(key, compiled);
        }
        pattern_set
    }

    /// 解析单条规则：`表达式\;version:模板\;confidence:50`
    /// 返回编译结果以及（若有）被吸收的正则错误
    pub fn compile_single_pattern(raw_pattern: &str) -> (CompiledPattern, Option<GowapError>) {
        let mut pattern = CompiledPattern {
            raw_text: String::new(),
            regex: None,
            version_template: String::new(),
            confidence: None,
        };
        let mut compile_error = None;

        for (index, segment) in raw_pattern.split(SEGMENT_SEPARATOR).enumerate() {
            if segment.is_empty() {
                continue;
            }

            if index == 0 {
                pattern.raw_text = segment.to_string();
                match Self::compile_expression(segment) {
                    Ok(regex) => pattern.regex = Some(regex),
                    Err(err) => compile_error = Some(err),
                }
                continue;
            }

            // 不符合 key:value 的指令直接忽略
            let Some((key, value)) = segment.split_once(':') else {
                continue;
            };
            if key == "version" {
                pattern.version_template = value.to_string();
            } else {
                match value.trim().parse::<u8>() {
                    Ok(confidence) => pattern.confidence = Some(confidence),
                    Err(_) => debug!("忽略无法解析的置信度：{}", segment),
                }
            }
        }

        (pattern, compile_error)
    }

    /// 转义处理后按忽略大小写编译
    /// 顺序固定：`\/` -> `/`，`\\` -> `\`，再把 `/` 转义为 `\/`
    pub fn compile_expression(expression: &str) -> GowapResult<Regex> {
        let unescaped = expression.replace("\\/", "/").replace("\\\\", "\\");
        let escaped = unescaped.replace('/', "\\/");
        let regex = RegexBuilder::new(&escaped).case_insensitive(true).build()?;
        Ok(regex)
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    counts: HashMap<Channel, usize>,
    degraded: usize,
}

impl CompileStats {
    fn count(&self, channel: Channel) -> usize {
        self.counts.get(&channel).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{MAIN_KEY, RuleLoader};
    use serde_json::json;

    fn compile_db(value: serde_json::Value) -> GowapResult<CompiledRuleLibrary> {
        let db = RuleLoader::from_json_str(&value.to_string())?;
        RuleCompiler::compile(&db)
    }

    #[test]
    fn test_escape_order() {
        let regex = RuleCompiler::compile_expression(r"example\/path\\\\x").unwrap();
        assert!(regex.is_match(r"see example/path\x here"));
        assert!(!regex.is_match("example/pathx"));

        // `\\/` 先把 `\/` 还原成 `/`，剩下的 `\` 与 `/` 组成 `\/` 再被转义
        let regex = RuleCompiler::compile_expression(r"a\\/b").unwrap();
        assert!(regex.is_match(r"a\/b"));
        assert!(!regex.is_match("a/b"));
    }

    #[test]
    fn test_case_insensitive() {
        let regex = RuleCompiler::compile_expression("WordPress").unwrap();
        assert!(regex.is_match("powered by wordpress"));
    }

    #[test]
    fn test_parse_directives() {
        let (pattern, err) =
            RuleCompiler::compile_single_pattern(r"nginx(?:/([\d.]+))?\;version:\1\;confidence:50");
        assert!(err.is_none());
        assert_eq!(pattern.raw_text, r"nginx(?:/([\d.]+))?");
        assert_eq!(pattern.version_template, r"\1");
        assert_eq!(pattern.confidence, Some(50));
        assert!(pattern.is_match("nginx/1.2"));
    }

    #[test]
    fn test_ternary_template_keeps_colon() {
        let (pattern, _) = RuleCompiler::compile_single_pattern(r"pro-(x)?\;version:\1?Pro:Free");
        assert_eq!(pattern.version_template, r"\1?Pro:Free");
    }

    #[test]
    fn test_malformed_directive_ignored() {
        let (pattern, err) = RuleCompiler::compile_single_pattern(r"jquery\;version\;confidence");
        assert!(err.is_none());
        assert_eq!(pattern.version_template, "");
        assert_eq!(pattern.confidence, None);
        assert!(pattern.regex.is_some());
    }

    #[test]
    fn test_presence_only_patterns() {
        let (pattern, err) = RuleCompiler::compile_single_pattern("");
        assert!(err.is_none());
        assert!(pattern.is_exists());

        let (pattern, err) = RuleCompiler::compile_single_pattern(r"\;confidence:75");
        assert!(err.is_none());
        assert!(pattern.is_exists());
        assert_eq!(pattern.confidence, Some(75));
    }

    #[test]
    fn test_invalid_regex_degrades() {
        let (pattern, err) = RuleCompiler::compile_single_pattern(r"foo(?=bar)\;version:\1");
        assert!(matches!(err, Some(GowapError::RegexCompileError(_))));
        assert!(pattern.regex.is_none());
        assert_eq!(pattern.raw_text, "foo(?=bar)");
        assert_eq!(pattern.version_template, r"\1");
        assert!(!pattern.is_match("foobar"));
    }

    #[test]
    fn test_compile_library() {
        let lib = compile_db(json!({
            "apps": {
                "Varnish": {
                    "cats": [23],
                    "headers": {"Via": "varnish", "X-Varnish": ""}
                },
                "Broken": {
                    "cats": [],
                    "html": ["(?<=x)y", "ok"]
                }
            },
            "categories": {"23": {"name": "Caching", "priority": 7}}
        }))
        .unwrap();

        assert_eq!(lib.len(), 2);
        let varnish = &lib.tech_patterns["Varnish"];
        assert_eq!(varnish.categories, vec!["Caching".to_string()]);
        assert!(varnish.url_patterns.is_empty());
        assert!(varnish.html_patterns.is_none());

        let headers = lib.lookup("Varnish", Channel::Headers).unwrap();
        assert!(headers["X-Varnish"][0].is_exists());
        assert!(headers["Via"][0].is_match("1.1 VARNISH"));

        // 单条失败不影响同组其他规则
        let html = lib.lookup("Broken", Channel::Html).unwrap();
        assert_eq!(html[MAIN_KEY].len(), 2);
        assert!(html[MAIN_KEY][0].regex.is_none());
        assert!(html[MAIN_KEY][1].regex.is_some());

        assert!(lib.lookup("Varnish", Channel::Url).is_some());
        assert!(lib.lookup("Missing", Channel::Url).is_none());
    }

    #[test]
    fn test_unknown_category_is_fatal() {
        let err = compile_db(json!({
            "apps": {"WordPress": {"cats": [1, 99], "html": "wp-content"}},
            "categories": {"1": {"name": "CMS", "priority": 1}}
        }))
        .unwrap_err();

        assert!(err.is_load_error());
        match err {
            GowapError::UnknownCategory { app, id } => {
                assert_eq!(app, "WordPress");
                assert_eq!(id, 99);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
