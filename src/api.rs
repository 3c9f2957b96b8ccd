use crate::crawler::ScrapeEngine;
use crate::error::ScrapeError;
use crate::types::{ImageResult, SafeSearch, ScrapeMetadata, ScrapeRequest};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const DEFAULT_COUNT: usize = 30;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScrapeEngine>,
    pub max_image_count: usize,
}

/// API 錯誤
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Scrape(ScrapeError),
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        ApiError::Scrape(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Scrape(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                (status, err.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// `/images` 的原始參數，全部以字串接收再自行轉換
#[derive(Debug, Default, Deserialize)]
pub struct ImagesParams {
    pub q: Option<String>,
    pub count: Option<String>,
    pub safe: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    pub query: String,
    pub count: usize,
    pub offset: u64,
    pub metadata: ScrapeMetadata,
    pub results: Vec<ImageResult>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async {
            "DuckDuckGo Image Scraper API is running. Use /images?q=<query> to start."
        }))
        .route("/images", get(search_images))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn search_images(
    State(state): State<AppState>,
    Query(params): Query<ImagesParams>,
) -> Result<Json<ImagesResponse>, ApiError> {
    let request = build_request(params, state.max_image_count)?;
    let outcome = state.engine.scrape(&request).await?;

    Ok(Json(ImagesResponse {
        query: request.query,
        count: outcome.results.len(),
        offset: request.offset,
        metadata: outcome.metadata,
        results: outcome.results,
    }))
}

/// 驗證並轉換參數
///
/// 非法的 count / safe / offset 不報錯，改用預設值；count 會被限制在上限內。
pub fn build_request(params: ImagesParams, max_image_count: usize) -> Result<ScrapeRequest, ApiError> {
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest(
            "The \"q\" parameter (search query) is required.".to_string()
        ))?;

    let count = parse_int(params.count.as_deref())
        .filter(|n| *n >= 1)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
        .unwrap_or(DEFAULT_COUNT)
        .min(max_image_count);

    let safe_search = parse_int(params.safe.as_deref())
        .and_then(SafeSearch::from_mode)
        .unwrap_or_default();

    let offset = parse_int(params.offset.as_deref())
        .map(|n| n.max(0) as u64)
        .unwrap_or(0);

    Ok(ScrapeRequest::new(query, count, safe_search, offset))
}

/// 讀取開頭的整數（可帶正負號），其後的字元忽略，如 "10abc" -> 10、"5.7" -> 5
fn parse_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim_start();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    // 只剩數字，parse 失敗只可能是溢位
    let value = rest[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
