use crate::error::ScrapeError;
use crate::fetcher::Fetcher;
use super::cache::TokenCache;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

/// vqd 快取 10 分鐘
pub const TOKEN_TTL: Duration = Duration::from_secs(10 * 60);

static VQD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"vqd=([\d-]+)").expect("vqd pattern is valid")
});

/// 從 DuckDuckGo 搜尋頁取得 vqd，並透過 TokenCache 快取
pub struct TokenProvider {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<TokenCache>,
    search_url: String,
    ttl: Duration,
}

impl TokenProvider {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: Arc<TokenCache>, base_url: &str) -> Self {
        Self {
            fetcher,
            cache,
            search_url: format!("{}/", base_url.trim_end_matches('/')),
            ttl: TOKEN_TTL,
        }
    }

    #[cfg(test)]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// 取得 query 對應的 vqd（先查快取）
    pub async fn acquire(&self, query: &str) -> Result<String, ScrapeError> {
        if let Some(token) = self.cache.get(query) {
            tracing::debug!(query, "使用快取的 vqd");
            return Ok(token);
        }

        tracing::info!(query, "取得新的 vqd");
        let params = vec![
            ("q".to_string(), query.to_string()),
            ("ia".to_string(), "web".to_string()),
        ];

        let body = self
            .fetcher
            .get(&self.search_url, &params)
            .await
            .map_err(|e| {
                tracing::error!(query, error = %e, "取得 vqd 失敗");
                ScrapeError::TokenFetch(e.to_string())
            })?;

        let token = extract_token(&body).ok_or_else(|| {
            tracing::error!(query, "搜尋頁中找不到 vqd");
            ScrapeError::TokenExtraction(
                "Failed to extract vqd token. DDG may have changed their layout.".to_string(),
            )
        })?;

        self.cache.set(query, token, self.ttl);
        tracing::info!(query, token, cached = self.cache.size(), "已快取 vqd");

        Ok(token.to_string())
    }
}

/// 從頁面內容擷取 `vqd=<數字與連字號>`
fn extract_token(body: &str) -> Option<&str> {
    VQD_PATTERN
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fetcher::stub::StubFetcher;

    const BASE: &str = "https://ddg.test";
    const SEARCH_URL: &str = "https://ddg.test/";

    fn provider(stub: &Arc<StubFetcher>) -> TokenProvider {
        TokenProvider::new(stub.clone(), Arc::new(TokenCache::new()), BASE)
    }

    #[test]
    fn test_extract_token() {
        let body = r#"<script>nrj('/d.js?q=cats&vqd=4-1234567890-98765&l=us-en')</script>"#;
        assert_eq!(extract_token(body), Some("4-1234567890-98765"));
        assert_eq!(extract_token("vqd=\"4-1\""), None);
        assert_eq!(extract_token("nothing here"), None);
    }

    #[tokio::test]
    async fn test_acquire_sends_query_and_ia() {
        let stub = Arc::new(StubFetcher::new());
        stub.push(SEARCH_URL, Ok("x vqd=4-42 y".to_string()));

        let token = provider(&stub).acquire("cute cats").await.unwrap();

        assert_eq!(token, "4-42");
        let calls = stub.calls_to(SEARCH_URL);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec![
            ("q".to_string(), "cute cats".to_string()),
            ("ia".to_string(), "web".to_string()),
        ]);
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let stub = Arc::new(StubFetcher::new());
        stub.push(SEARCH_URL, Ok("vqd=4-1".to_string()));
        let provider = provider(&stub);

        assert_eq!(provider.acquire("cats").await.unwrap(), "4-1");
        assert_eq!(provider.acquire("cats").await.unwrap(), "4-1");
        assert_eq!(stub.calls_to(SEARCH_URL).len(), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_refetched() {
        let stub = Arc::new(StubFetcher::new());
        stub.push(SEARCH_URL, Ok("vqd=4-1".to_string()));
        stub.push(SEARCH_URL, Ok("vqd=4-2".to_string()));
        let provider = provider(&stub).with_ttl(Duration::ZERO);

        assert_eq!(provider.acquire("cats").await.unwrap(), "4-1");
        assert_eq!(provider.acquire("cats").await.unwrap(), "4-2");
        assert_eq!(stub.calls_to(SEARCH_URL).len(), 2);
    }

    #[tokio::test]
    async fn test_missing_marker_is_extraction_error() {
        let stub = Arc::new(StubFetcher::new());
        stub.push(SEARCH_URL, Ok("<html>new layout</html>".to_string()));

        let err = provider(&stub).acquire("cats").await.unwrap_err();

        assert!(matches!(err, ScrapeError::TokenExtraction(_)));
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_http_failure_is_fetch_error() {
        let stub = Arc::new(StubFetcher::new());
        stub.push(SEARCH_URL, Err(FetchError::Status(503)));

        let err = provider(&stub).acquire("cats").await.unwrap_err();

        assert!(matches!(err, ScrapeError::TokenFetch(_)));
        assert_eq!(err.status_code(), 502);
        assert!(err.to_string().ends_with("HTTP status 503"));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let stub = Arc::new(StubFetcher::new());
        stub.push(SEARCH_URL, Err(FetchError::Request("connection reset".into())));
        stub.push(SEARCH_URL, Ok("vqd=4-9".to_string()));
        let provider = provider(&stub);

        assert!(provider.acquire("cats").await.is_err());
        assert_eq!(provider.acquire("cats").await.unwrap(), "4-9");
    }
}
