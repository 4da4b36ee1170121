//! 指纹库数据模型定义
//! 仅描述原始JSON的结构，不包含任何匹配逻辑

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Deserializer, Serialize};

/// 技术检测结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)?;
        } else {
            write!(f, "{} {}", self.name, self.version)?;
        }
        if !self.categories.is_empty() {
            write!(f, " [{}]", self.categories.join(", "))?;
        }
        Ok(())
    }
}

/// 检测规则字段的三种原始形态
/// - 单个字符串：归入 `main`
/// - 字符串列表：全部归入 `main`
/// - 字符串映射：键为 Header/Cookie 名
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawPatternField {
    Single(String),
    List(Vec<String>),
    Keyed(HashMap<String, String>),
}

/// 无键通道使用的固定键
pub const MAIN_KEY: &str = "main";

impl RawPatternField {
    /// 归一化为 键 -> 原始规则列表
    pub fn normalize(&self) -> HashMap<String, Vec<String>> {
        let mut normalized: HashMap<String, Vec<String>> = HashMap::new();
        match self {
            RawPatternField::Single(s) => {
                normalized.insert(MAIN_KEY.to_string(), vec![s.clone()]);
            }
            RawPatternField::List(list) => {
                normalized.insert(MAIN_KEY.to_string(), list.clone());
            }
            RawPatternField::Keyed(map) => {
                for (key, value) in map {
                    normalized.entry(key.clone()).or_default().push(value.clone());
                }
            }
        }
        normalized
    }
}

/// 技术规则定义（从指纹库JSON解析）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawApp {
    #[serde(rename = "cats", default)]
    pub category_ids: Vec<u32>,
    #[serde(default)]
    pub website: Option<String>,

    // 检测规则
    #[serde(default)]
    pub url: Option<RawPatternField>,
    #[serde(default)]
    pub html: Option<RawPatternField>,
    #[serde(default)]
    pub headers: Option<RawPatternField>,
    #[serde(default)]
    pub cookies: Option<RawPatternField>,
    #[serde(default)]
    pub scripts: Option<RawPatternField>,

    // 关联规则
    #[serde(default, deserialize_with = "relation_names")]
    pub implies: Vec<String>,
    #[serde(default, deserialize_with = "relation_names")]
    pub excludes: Vec<String>,
}

/// 分类规则定义
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
}

/// 完整指纹库
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFingerprintDb {
    #[serde(default)]
    pub apps: HashMap<String, RawApp>,
    #[serde(default)]
    pub categories: HashMap<String, CategoryRule>,
}

/// implies/excludes 既可能是字符串也可能是字符串列表，统一为名称列表。
/// 社区数据里常见 `PHP\;confidence:50` 这种写法，只保留 `\;` 之前的名称。
fn relation_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let raw = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names,
    };

    Ok(raw
        .iter()
        .filter_map(|name| {
            let name = name.split("\\;").next().unwrap_or("").trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect())
}
