//! 检测模块：技术检测核心逻辑
pub mod analyzer;
pub mod http_data;
pub mod fetcher;
pub mod detector;

// 导出核心接口
pub use self::analyzer::{
    Analyzer, UrlAnalyzer, HeaderAnalyzer, HtmlAnalyzer, CookieAnalyzer, ScriptAnalyzer,
};
pub use self::http_data::HttpData;
pub use self::fetcher::HttpFetcher;
pub use self::detector::{TechDetector, load_database, analyze, technologies_to_json};
