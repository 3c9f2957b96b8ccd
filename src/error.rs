use thiserror::Error;

/// 搜尋流程中可能出現的錯誤
///
/// 全部都不重試，任何一種都會中止整次搜尋，已抓到的頁面一併丟棄。
#[derive(Debug, Clone, Error)]
pub enum ScrapeError {
    /// 搜尋頁裡找不到 vqd（多半是對方改版）
    #[error("Could not fetch vqd token from DuckDuckGo: {0}")]
    TokenExtraction(String),

    /// 取得 vqd 時網路或 HTTP 失敗
    #[error("Could not fetch vqd token from DuckDuckGo: {0}")]
    TokenFetch(String),

    /// 翻頁時被限流 (HTTP 429)
    #[error("Rate limited by DuckDuckGo.")]
    RateLimited,

    /// 翻頁時其他失敗
    #[error("Failed to fetch results from DuckDuckGo: {0}")]
    UpstreamFetch(String),
}

impl ScrapeError {
    /// 對呼叫端回報的 HTTP 狀態碼
    pub fn status_code(&self) -> u16 {
        match self {
            ScrapeError::RateLimited => 429,
            ScrapeError::TokenExtraction(_)
            | ScrapeError::TokenFetch(_)
            | ScrapeError::UpstreamFetch(_) => 502,
        }
    }
}

/// 單次 HTTP GET 的失敗
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Request(err.to_string()),
        }
    }
}
