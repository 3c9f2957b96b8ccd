use crate::config::ScraperConfig;
use crate::error::FetchError;
use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::time::Duration;

/// HTTP Fetcher trait - 抽象介面（測試時可換成假的實作）
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// 送出 GET，成功時回傳 body
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String, FetchError>;
}

/// HTTP 實作
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// 建立新的 HTTP Fetcher，帶上 DuckDuckGo 需要的固定 headers
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(
            "application/json, text/javascript, */*; q=0.01"
        ));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)
            .context("USER_AGENT 含有不合法的字元")?);
        headers.insert(REFERER, HeaderValue::from_static("https://duckduckgo.com/"));
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("empty"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("cors"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-origin"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .context("無法建立 HTTP 客戶端")?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<String, FetchError> {
        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
