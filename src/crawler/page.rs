use crate::error::{FetchError, ScrapeError};
use crate::fetcher::Fetcher;
use crate::types::ImageResult;
use serde_json::Value;
use std::sync::Arc;

/// 下一頁需要的完整參數（直接取代上一頁的參數，不合併）
pub type PageCursor = Vec<(String, String)>;

/// 把 i.js 的單筆紀錄投影成 ImageResult
///
/// 欄位型別不符時只影響該欄位，不讓整頁失敗。
fn project_record(raw: &Value) -> ImageResult {
    ImageResult {
        title: text_field(raw, "title"),
        image: text_field(raw, "image"),
        thumbnail: text_field(raw, "thumbnail"),
        width: dimension_field(raw, "width"),
        height: dimension_field(raw, "height"),
        source: text_field(raw, "source"),
        page_url: text_field(raw, "url"),
    }
}

fn text_field(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn dimension_field(raw: &Value, key: &str) -> u32 {
    let Some(value) = raw.get(key) else { return 0 };

    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|n| *n >= 0.0).map(|n| n as u64))
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// 單頁結果
#[derive(Debug)]
pub struct Page {
    pub items: Vec<ImageResult>,
    /// None 表示沒有下一頁
    pub next_params: Option<PageCursor>,
}

/// 抓取 i.js 單頁並轉成 ImageResult
pub struct PageFetcher {
    fetcher: Arc<dyn Fetcher>,
    images_url: String,
}

impl PageFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            images_url: format!("{}/i.js", base_url.trim_end_matches('/')),
        }
    }

    pub async fn fetch_page(&self, params: &[(String, String)]) -> Result<Page, ScrapeError> {
        let body = self
            .fetcher
            .get(&self.images_url, params)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "i.js 請求失敗");
                match e {
                    FetchError::Status(429) => ScrapeError::RateLimited,
                    other => ScrapeError::UpstreamFetch(other.to_string()),
                }
            })?;

        let raw: Value = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "i.js 回應不是 JSON");
            ScrapeError::UpstreamFetch(format!("invalid JSON response: {}", e))
        })?;

        // 不是物件或沒有 results 時等同空頁
        let items: Vec<ImageResult> = raw
            .get("results")
            .and_then(Value::as_array)
            .map(|records| records.iter().map(project_record).collect())
            .unwrap_or_default();

        // 空頁一律視為最後一頁
        let next_params = if items.is_empty() {
            None
        } else {
            raw.get("next").and_then(Value::as_str).and_then(parse_cursor)
        };

        Ok(Page { items, next_params })
    }
}

/// 解析 `next`（相對路徑加 query string）為下一頁參數
///
/// 沒有 query string 時視為沒有下一頁。
fn parse_cursor(next: &str) -> Option<PageCursor> {
    let (_, query) = next.split_once('?')?;
    let params: PageCursor = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    if params.is_empty() { None } else { Some(params) }
}
