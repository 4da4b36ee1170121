//! 检测器核心：整合各类分析器，输出检测结果
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::analyzer::{Analyzer, CookieAnalyzer, HeaderAnalyzer, HtmlAnalyzer, ScriptAnalyzer, UrlAnalyzer};
use super::http_data::HttpData;
use crate::compiler::{CompiledRuleLibrary, RuleCompiler};
use crate::config::GlobalConfig;
use crate::error::{GowapError, GowapResult};
use crate::rule::{CategoryRule, RawApp, RawFingerprintDb, RuleLoader, Technology};
use crate::utils::{DetectionSet, DetectionUpdater};

/// 由已解码的 apps / categories 构建只读指纹库
pub fn load_database(
    raw_apps: HashMap<String, RawApp>,
    raw_categories: HashMap<String, CategoryRule>,
) -> GowapResult<CompiledRuleLibrary> {
    RuleCompiler::compile(&RawFingerprintDb {
        apps: raw_apps,
        categories: raw_categories,
    })
}

/// 对一份证据数据执行完整检测
pub fn analyze(compiled_lib: &CompiledRuleLibrary, data: &HttpData) -> GowapResult<Vec<Technology>> {
    let cookies = data.cookies();
    let mut detected = DetectionSet::new();

    // 1. 五个通道依次分析
    UrlAnalyzer::analyze(compiled_lib, data.url.as_str(), &mut detected);
    HeaderAnalyzer::analyze(compiled_lib, &data.headers, &mut detected);
    HtmlAnalyzer::analyze(compiled_lib, data.html.as_str(), &mut detected);
    CookieAnalyzer::analyze(compiled_lib, &cookies, &mut detected);
    ScriptAnalyzer::analyze(compiled_lib, data.scripts.as_slice(), &mut detected);

    // 2. 应用 excludes / implies
    DetectionUpdater::resolve_relations(compiled_lib, &mut detected);

    // 3. 转换为最终结果
    let mut technologies: Vec<Technology> = detected.into_values().map(Technology::from).collect();
    technologies.sort_by(|a, b| a.name.cmp(&b.name));

    debug!("{} 检测完成，命中技术{}个", data.url, technologies.len());
    Ok(technologies)
}

/// 检测结果序列化为JSON
pub fn technologies_to_json(technologies: &[Technology], pretty: bool) -> GowapResult<String> {
    let output = if pretty {
        serde_json::to_string_pretty(technologies)
    } else {
        serde_json::to_string(technologies)
    };
    output.map_err(|e| GowapError::AnalysisError(e.to_string()))
}

/// 技术检测器，可在多个线程间共享
#[derive(Debug, Clone)]
pub struct TechDetector {
    compiled_lib: Arc<CompiledRuleLibrary>,
}

impl TechDetector {
    pub fn new(compiled_lib: Arc<CompiledRuleLibrary>) -> Self {
        Self { compiled_lib }
    }

    /// 编译原始指纹库并创建检测器
    pub fn from_db(db: &RawFingerprintDb) -> GowapResult<Self> {
        let compiled_lib = RuleCompiler::compile(db)?;
        Ok(Self::new(Arc::new(compiled_lib)))
    }

    pub fn from_json_str(text: &str) -> GowapResult<Self> {
        Self::from_db(&RuleLoader::from_json_str(text)?)
    }

    /// 按配置读取指纹库文件并创建检测器
    pub async fn from_config(config: &GlobalConfig) -> GowapResult<Self> {
        let db = RuleLoader::load(config).await?;
        Self::from_db(&db)
    }

    pub fn library(&self) -> &CompiledRuleLibrary {
        &self.compiled_lib
    }

    /// 核心检测接口
    pub fn analyze(&self, data: &HttpData) -> GowapResult<Vec<Technology>> {
        analyze(&self.compiled_lib, data)
    }

    /// 检测并以JSON输出
    pub fn analyze_json(&self, data: &HttpData, pretty: bool) -> GowapResult<String> {
        let technologies = self.analyze(data)?;
        technologies_to_json(&technologies, pretty)
    }
}
