//! 目标页面抓取
//! 单次GET请求，不重试，响应状态码不影响后续检测

use std::time::Duration;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::http_data::HttpData;
use crate::config::GlobalConfig;
use crate::error::{GowapError, GowapResult};
use crate::utils::HeaderConverter;

/// HTTP抓取器
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &GlobalConfig) -> GowapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }

    /// 抓取目标URL并构造证据数据
    pub async fn fetch(&self, url: &str) -> GowapResult<HttpData> {
        let target = Self::parse_target(url)?;

        let response = self.client.get(target).send().await?;
        let status = response.status();
        let headers = HeaderConverter::to_hashmap(response.headers());
        let html = response.text().await?;

        debug!("{} 抓取完成，状态码{}，正文{}字节", url, status, html.len());
        Ok(HttpData::new(url, headers, html))
    }

    /// 校验URL，仅支持 http/https
    fn parse_target(url: &str) -> GowapResult<Url> {
        let target = Url::parse(url)?;
        match target.scheme() {
            "http" | "https" => Ok(target),
            scheme => Err(GowapError::InvalidInput(format!("不支持的URL协议：{}", scheme))),
        }
    }
}
