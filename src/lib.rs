//! rsgowap - 基于指纹库的网站技术栈识别引擎

// 导出全局错误类型
pub use self::error::{GowapError, GowapResult};

// 导出配置模块
pub use self::config::{GlobalConfig, ConfigManager, CustomConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{
    Technology, RawApp, RawPatternField, CategoryRule, RawFingerprintDb, RuleLoader
};

// 导出提取模块核心接口
pub use self::extractor::HtmlExtractor;

// 导出工具模块核心接口
pub use self::utils::{
    VersionExtractor, HeaderConverter, HeaderValues, Detection, DetectionSet, DetectionUpdater
};

// 导出编译模块核心接口
pub use self::compiler::{
    Channel, CompiledTechRule, CompiledRuleLibrary, RuleCompiler, CompiledPattern, PatternSet
};

// 导出检测模块核心接口
pub use self::detector::{
    TechDetector,
    HttpData,
    HttpFetcher,
    load_database,
    analyze,
    technologies_to_json,
};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod extractor;
pub mod utils;
pub mod compiler;
pub mod detector;
