//! 单次检测的证据数据
use std::collections::HashMap;

use crate::extractor::HtmlExtractor;
use crate::utils::{HeaderConverter, HeaderValues};

/// 请求URL、归一化响应头、HTML正文以及script src列表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpData {
    pub url: String,
    pub headers: HeaderValues,
    pub html: String,
    pub scripts: Vec<String>,
}

impl HttpData {
    /// 构造证据数据，script src 从 HTML 中提取
    pub fn new(url: impl Into<String>, headers: HeaderValues, html: impl Into<String>) -> Self {
        let html = html.into();
        let scripts = HtmlExtractor::extract_script_srcs(&html);
        Self::with_scripts(url, headers, html, scripts)
    }

    /// 构造证据数据，script src 由调用方提供
    pub fn with_scripts(
        url: impl Into<String>,
        headers: HeaderValues,
        html: impl Into<String>,
        scripts: Vec<String>,
    ) -> Self {
        let mut normalized = HeaderValues::with_capacity(headers.len());
        for (name, values) in headers {
            normalized
                .entry(HeaderConverter::normalize_name(&name))
                .or_insert_with(Vec::new)
                .extend(values);
        }

        Self {
            url: url.into(),
            headers: normalized,
            html: html.into(),
            scripts,
        }
    }

    /// 从原始响应头文本构造
    pub fn from_raw_headers(url: impl Into<String>, raw_headers: &str, html: impl Into<String>) -> Self {
        Self::new(url, HeaderConverter::from_raw(raw_headers), html)
    }

    /// Cookie 名 -> 值，来自 set-cookie
    pub fn cookies(&self) -> HashMap<String, String> {
        HeaderConverter::parse_cookies(&self.headers)
    }
}
