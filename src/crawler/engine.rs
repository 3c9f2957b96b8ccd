use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::token::{TokenCache, TokenProvider};
use crate::types::{ImageResult, ScrapeMetadata, ScrapeOutcome, ScrapeRequest};
use super::page::{PageCursor, PageFetcher};
use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 單次搜尋的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrapeState {
    Idle,
    AcquiringToken,
    FetchingPage(u32),
    Done,
    Failed,
}

impl fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeState::Idle => write!(f, "idle"),
            ScrapeState::AcquiringToken => write!(f, "acquiring-token"),
            ScrapeState::FetchingPage(page) => write!(f, "fetching-page-{}", page),
            ScrapeState::Done => write!(f, "done"),
            ScrapeState::Failed => write!(f, "failed"),
        }
    }
}

/// 主搜尋引擎：取得 vqd、逐頁抓取、裁切結果
pub struct ScrapeEngine {
    tokens: TokenProvider,
    pages: PageFetcher,
    delay: Duration,
}

impl ScrapeEngine {
    /// 使用真正的 HTTP client 與一份新的 TokenCache
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config)?);
        Ok(Self::with_fetcher(fetcher, Arc::new(TokenCache::new()), config))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, cache: Arc<TokenCache>, config: &ScraperConfig) -> Self {
        Self {
            tokens: TokenProvider::new(Arc::clone(&fetcher), cache, &config.base_url),
            pages: PageFetcher::new(fetcher, &config.base_url),
            delay: config.request_delay(),
        }
    }

    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeOutcome, ScrapeError> {
        let started = Instant::now();
        let mut state = ScrapeState::Idle;

        let result = self.run(request, &mut state).await;
        match &result {
            Ok(_) => transition(&mut state, ScrapeState::Done),
            Err(e) => {
                tracing::warn!(query = %request.query, error = %e, "搜尋失敗於 {}", state);
                transition(&mut state, ScrapeState::Failed);
            }
        }

        let (mut results, pages_fetched) = result?;
        results.truncate(request.count);

        let elapsed = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        tracing::info!(
            "Scraped {} images for query \"{}\" with offset {} in {:.2}s.",
            results.len(),
            request.query,
            request.offset,
            elapsed
        );

        Ok(ScrapeOutcome {
            results,
            metadata: ScrapeMetadata {
                elapsed_time_seconds: elapsed,
                pages_fetched,
            },
        })
    }

    /// 逐頁抓取，回傳尚未裁切的結果與頁數
    async fn run(
        &self,
        request: &ScrapeRequest,
        state: &mut ScrapeState,
    ) -> Result<(Vec<ImageResult>, u32), ScrapeError> {
        transition(state, ScrapeState::AcquiringToken);
        let token = self.tokens.acquire(&request.query).await?;

        let mut params = initial_params(request, &token);
        let mut results = Vec::new();
        let mut pages_fetched = 0u32;

        while results.len() < request.count {
            pages_fetched += 1;
            transition(state, ScrapeState::FetchingPage(pages_fetched));

            let page = self.pages.fetch_page(&params).await?;
            if page.items.is_empty() {
                break;
            }
            results.extend(page.items);

            if results.len() >= request.count {
                break;
            }

            match page.next_params {
                Some(next) => {
                    params = next;
                    tokio::time::sleep(self.delay).await;
                }
                None => break,
            }
        }

        Ok((results, pages_fetched))
    }
}

fn transition(state: &mut ScrapeState, next: ScrapeState) {
    tracing::debug!("{} -> {}", state, next);
    *state = next;
}

/// 第一頁的參數；`s` 是結果的位移量
fn initial_params(request: &ScrapeRequest, token: &str) -> PageCursor {
    vec![
        ("l".to_string(), "us-en".to_string()),
        ("o".to_string(), "json".to_string()),
        ("q".to_string(), request.query.clone()),
        ("vqd".to_string(), token.to_string()),
        ("f".to_string(), ",,,".to_string()),
        ("p".to_string(), request.safe_search.wire_value().to_string()),
        ("s".to_string(), request.offset.to_string()),
    ]
}
