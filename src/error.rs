//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum GowapError {
    // 指纹库加载相关错误（致命，整体加载失败）
    #[error("指纹库加载失败：{0}")]
    RuleLoadError(String),
    #[error("技术 {app} 引用了不存在的分类ID：{id}")]
    UnknownCategory { app: String, id: u32 },

    // 编译相关错误（单条规则降级，不会中断加载）
    #[error("正则编译失败：{0}")]
    RegexCompileError(#[from] RegexError),

    // 检测相关错误
    #[error("检测结果输出失败：{0}")]
    AnalysisError(String),

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
}

impl GowapError {
    /// 是否为加载阶段的致命错误
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            GowapError::RuleLoadError(_)
                | GowapError::UnknownCategory { .. }
                | GowapError::JsonError(_)
        )
    }
}

// 全局Result类型
pub type GowapResult<T> = Result<T, GowapError>;
