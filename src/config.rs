use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// 爬蟲配置
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// 送給 DuckDuckGo 的 User-Agent
    pub user_agent: String,
    /// 每頁之間的間隔（毫秒）
    pub request_delay_ms: u64,
    /// 單次請求允許的最大圖片數
    pub max_image_count: usize,
    /// 請求超時（秒）
    pub timeout_secs: u64,
    /// DuckDuckGo 的根網址（測試時換成 mock server）
    pub base_url: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_delay_ms: 500,
            max_image_count: 200,
            timeout_secs: 30,
            base_url: "https://duckduckgo.com".to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 從環境變數讀取，未設定的欄位使用預設值
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(user_agent) = env::var("USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(delay_ms) = parse_var("REQUEST_DELAY_MS")? {
            config = config.with_delay(delay_ms);
        }
        if let Some(max) = parse_var("MAX_IMAGE_COUNT")? {
            config.max_image_count = max;
        }
        if let Some(timeout_secs) = parse_var("HTTP_TIMEOUT_SECS")? {
            config = config.with_timeout(timeout_secs);
        }
        if let Ok(base_url) = env::var("PROVIDER_BASE_URL") {
            config = config.with_base_url(base_url);
        }

        Ok(config)
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.request_delay_ms = delay_ms;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// 伺服器監聽位址
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: parse_var("PORT")?.unwrap_or(3000),
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("環境變數 {} 格式錯誤: {:?}", name, raw)),
        Err(_) => Ok(None),
    }
}
