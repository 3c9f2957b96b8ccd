use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// 快取中的 vqd
#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// 以原始查詢字串為 key 的 vqd 快取
///
/// 整個行程共用一份，過期只在讀取時檢查，不主動清除。
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: RwLock<HashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得尚未過期的 token
    pub fn get(&self, query: &str) -> Option<String> {
        let entries = self.read();
        let entry = entries.get(query)?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.token.clone())
        }
    }

    /// 寫入（或覆蓋）一筆 token
    pub fn set(&self, query: &str, token: &str, ttl: Duration) {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.write().insert(
            query.to_string(),
            CachedToken {
                token: token.to_string(),
                expires_at,
            },
        );
    }

    pub fn size(&self) -> usize {
        self.read().len()
    }

    // 其他執行緒在持鎖時 panic 不會破壞 HashMap 本身，直接沿用
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CachedToken>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!("vqd 快取鎖已中毒，繼續使用既有內容");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CachedToken>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("vqd 快取鎖已中毒，繼續使用既有內容");
            PoisonError::into_inner(poisoned)
        })
    }
}
