//! 提取模块：从HTML中提取匹配所需的标签信息
pub mod html_extractor;

pub use self::html_extractor::HtmlExtractor;
