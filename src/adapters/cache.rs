//! 以記憶體實作的 [`Cache`]，每筆資料各自有存活時間

use crate::domain::ports::Cache;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// 單筆存活時間上限（30 天）
pub const MAX_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    default_ttl: Duration,
    capacity: usize,
}

impl CacheInner {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(|entry| {
            if Instant::now() < entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: String, value: String, ttl: Duration) {
        if !self.map.contains_key(&key) && self.map.len() >= self.capacity {
            self.evict();
        }
        let now = Instant::now();
        let expires_at = now.checked_add(ttl.min(MAX_TTL)).unwrap_or(now);
        self.map.insert(key, CacheEntry { value, expires_at });
    }

    /// 先清掉過期項目；仍然滿載時移除最早到期的一筆
    fn evict(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);

        if self.map.len() >= self.capacity {
            let oldest = self
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                self.map.remove(&key);
            }
        }
    }
}

/// 跨請求共用的 TTL 快取。
///
/// 同一個 key 同時未命中時兩邊都會向上游查詢，不做 single-flight。
#[derive(Debug, Clone)]
pub struct TtlCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl TtlCache {
    pub fn new(default_ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                map: HashMap::new(),
                default_ttl,
                capacity: capacity.max(1),
            })),
        }
    }

    /// 不保存任何資料的快取
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, 1)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Cache for TtlCache {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.inner.read().await;
        store.get(key)
    }

    async fn put(&self, key: String, value: String, ttl: Option<Duration>) {
        let mut store = self.inner.write().await;
        let ttl = ttl.unwrap_or(store.default_ttl);
        if ttl == Duration::ZERO {
            return;
        }
        store.put(key, value, ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = TtlCache::new(Duration::from_secs(60), 8);
        cache.put("fred:2024".to_string(), "{}".to_string(), None).await;

        assert_eq!(cache.get("fred:2024").await.as_deref(), Some("{}"));
        assert_eq!(cache.get("ecos:2024").await, None);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = TtlCache::new(Duration::from_secs(60), 8);
        cache
            .put("short".to_string(), "v".to_string(), Some(Duration::from_millis(20)))
            .await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("short").await, None);
    }

    #[tokio::test]
    async fn test_huge_ttl_is_capped() {
        let cache = TtlCache::new(Duration::from_secs(u64::MAX), 8);
        cache.put("k".to_string(), "v".to_string(), None).await;
        cache.put("m".to_string(), "w".to_string(), Some(Duration::MAX)).await;

        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
        assert_eq!(cache.get("m").await.as_deref(), Some("w"));
    }

    #[tokio::test]
    async fn test_disabled_cache_stores_nothing() {
        let cache = TtlCache::disabled();
        cache.put("k".to_string(), "v".to_string(), None).await;

        assert!(cache.is_empty().await);
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_earliest_expiry() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache
            .put("a".to_string(), "1".to_string(), Some(Duration::from_secs(10)))
            .await;
        cache.put("b".to_string(), "2".to_string(), None).await;
        cache.put("c".to_string(), "3".to_string(), None).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("c").await.as_deref(), Some("3"));
    }
}
