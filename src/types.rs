use serde::{Deserialize, Serialize};

/// 單張圖片搜尋結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    /// 圖片標題
    pub title: String,
    /// 原圖 URL
    pub image: String,
    /// 縮圖 URL
    pub thumbnail: String,
    pub width: u32,
    pub height: u32,
    /// 來源網站名稱
    pub source: String,
    /// 圖片所在頁面
    pub page_url: String,
}

/// 安全搜尋模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SafeSearch {
    /// 1
    #[default]
    Strict,
    /// 0
    Off,
    /// -1
    Moderate,
}

impl SafeSearch {
    /// 轉成 DuckDuckGo 的 `p` 參數
    ///
    /// 0 對應 "-2" 是對方自己的慣例，不要「修正」它。
    pub fn wire_value(self) -> &'static str {
        match self {
            SafeSearch::Strict => "1",
            SafeSearch::Off => "-2",
            SafeSearch::Moderate => "-1",
        }
    }

    /// 從呼叫端的整數模式解析，不合法時回傳 None
    pub fn from_mode(mode: i64) -> Option<Self> {
        match mode {
            1 => Some(SafeSearch::Strict),
            0 => Some(SafeSearch::Off),
            -1 => Some(SafeSearch::Moderate),
            _ => None,
        }
    }
}

/// 已驗證的搜尋請求
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub query: String,
    pub count: usize,
    pub safe_search: SafeSearch,
    pub offset: u64,
}

impl ScrapeRequest {
    pub fn new(query: impl Into<String>, count: usize, safe_search: SafeSearch, offset: u64) -> Self {
        Self {
            query: query.into(),
            count,
            safe_search,
            offset,
        }
    }
}

/// 執行資訊
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMetadata {
    /// 耗時（秒，取到小數點後兩位）
    pub elapsed_time_seconds: f64,
    /// 實際送出的頁面請求數
    pub pages_fetched: u32,
}

/// 一次搜尋的最終結果
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub results: Vec<ImageResult>,
    pub metadata: ScrapeMetadata,
}
