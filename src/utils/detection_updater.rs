//! 检测结果更新工具
//! 负责创建检测记录、按字符串序更新版本、处理 excludes/implies 关联

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::compiler::{CompiledRuleLibrary, CompiledTechRule};
use crate::rule::Technology;

/// 单次检测中某个技术的命中记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub name: String,
    pub version: String,
    pub categories: Vec<String>,
    pub excludes: Vec<String>,
    pub implies: Vec<String>,
}

impl Detection {
    pub fn from_rule(tech: &CompiledTechRule) -> Self {
        Self {
            name: tech.name.clone(),
            version: String::new(),
            categories: tech.categories.clone(),
            excludes: tech.excludes.clone(),
            implies: tech.implies.clone(),
        }
    }
}

impl From<Detection> for Technology {
    fn from(detection: Detection) -> Self {
        Technology {
            name: detection.name,
            version: detection.version,
            categories: detection.categories,
        }
    }
}

/// 技术名 -> 命中记录
pub type DetectionSet = HashMap<String, Detection>;

/// 检测结果更新工具
pub struct DetectionUpdater;

impl DetectionUpdater {
    /// 取得技术的命中记录，首次命中时创建
    pub fn register<'a>(detected: &'a mut DetectionSet, tech: &CompiledTechRule) -> &'a mut Detection {
        detected.entry(tech.name.clone()).or_insert_with(|| {
            debug!("新增检测记录：{}", tech.name);
            Detection::from_rule(tech)
        })
    }

    /// 版本只按普通字符串比较向"大"的方向更新，因此 "1.2" 会胜过 "1.10"
    pub fn refine_version(detection: &mut Detection, version: String) {
        if !version.is_empty() && version > detection.version {
            detection.version = version;
        }
    }

    /// 处理关联规则
    ///
    /// 只遍历一次开始时已存在的记录：先移除其 excludes，再递归补全其 implies。
    /// 遍历中已被排除的记录直接跳过；推导出的技术只继续展开自身的 implies。
    pub fn resolve_relations(compiled_lib: &CompiledRuleLibrary, detected: &mut DetectionSet) {
        let names: Vec<String> = detected.keys().cloned().collect();
        let mut visited = HashSet::new();

        for name in names {
            let Some(detection) = detected.get(&name) else {
                continue;
            };
            let excludes = detection.excludes.clone();
            let implies = detection.implies.clone();

            for excluded in &excludes {
                if detected.remove(excluded).is_some() {
                    debug!("[Excludes] {} 排除了 {}", name, excluded);
                }
            }

            Self::resolve_implies(compiled_lib, detected, &name, &implies, &mut visited);
        }
    }

    fn resolve_implies(
        compiled_lib: &CompiledRuleLibrary,
        detected: &mut DetectionSet,
        source: &str,
        implies: &[String],
        visited: &mut HashSet<String>,
    ) {
        for implied in implies {
            let Some(tech) = compiled_lib.tech_patterns.get(implied) else {
                debug!("[Implies] {} 推导的 {} 不在指纹库中，已忽略", source, implied);
                continue;
            };
            if detected.contains_key(implied) || !visited.insert(implied.to_lowercase()) {
                continue;
            }

            debug!("[Implies] {} 推导出 {}", source, implied);
            detected.insert(implied.clone(), Detection::from_rule(tech));
            Self::resolve_implies(compiled_lib, detected, implied, &tech.implies, visited);
        }
    }
}
