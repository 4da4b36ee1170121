//! 指纹库加载
//! 负责读取本地指纹库文件并解码为原始数据模型

use std::path::Path;
use tracing::debug;

use super::model::RawFingerprintDb;
use crate::config::GlobalConfig;
use crate::error::{GowapError, GowapResult};

/// 指纹库加载器
pub struct RuleLoader;

impl RuleLoader {
    /// 按配置加载指纹库
    pub async fn load(config: &GlobalConfig) -> GowapResult<RawFingerprintDb> {
        Self::load_from_path(&config.fingerprint_path).await
    }

    /// 从指定路径加载指纹库
    pub async fn load_from_path(path: &Path) -> GowapResult<RawFingerprintDb> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            GowapError::RuleLoadError(format!("读取指纹库文件 {} 失败：{}", path.display(), e))
        })?;
        let db = Self::from_json_str(&text)?;
        debug!(
            "指纹库文件 {} 加载成功，技术规则数：{}，分类规则数：{}",
            path.display(),
            db.apps.len(),
            db.categories.len()
        );
        Ok(db)
    }

    /// 从JSON文本解码指纹库
    pub fn from_json_str(text: &str) -> GowapResult<RawFingerprintDb> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if value.get("apps").is_none() {
            return Err(GowapError::RuleLoadError("指纹库缺少顶层字段 apps".to_string()));
        }
        if value.get("categories").is_none() {
            return Err(GowapError::RuleLoadError("指纹库缺少顶层字段 categories".to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "apps": {
            "Nginx": {"cats": [22], "headers": {"Server": "nginx(?:/([\\d.]+))?\\;version:\\1"}}
        },
        "categories": {"22": {"name": "Web servers", "priority": 8}}
    }"#;

    #[test]
    fn test_from_json_str() {
        let db = RuleLoader::from_json_str(SAMPLE).unwrap();
        assert_eq!(db.apps.len(), 1);
        assert_eq!(db.categories["22"].name, "Web servers");
        assert_eq!(db.categories["22"].priority, 8);
    }

    #[test]
    fn test_malformed_json_is_load_error() {
        let err = RuleLoader::from_json_str("{\"apps\": ").unwrap_err();
        assert!(err.is_load_error());

        let err = RuleLoader::from_json_str("{\"apps\": {}}").unwrap_err();
        assert!(matches!(err, GowapError::RuleLoadError(_)));
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let path = std::env::temp_dir().join(format!("rsgowap_loader_{}.json", std::process::id()));
        tokio::fs::write(&path, SAMPLE).await.unwrap();

        let config = crate::config::ConfigManager::custom()
            .fingerprint_path(path.clone())
            .build();
        let db = RuleLoader::load(&config).await.unwrap();
        assert!(db.apps.contains_key("Nginx"));

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = RuleLoader::load_from_path(Path::new("/nonexistent/rsgowap/app.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, GowapError::RuleLoadError(_)));
    }
}
