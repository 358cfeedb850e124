//! Process-local cache store.

use super::{CacheBackend, CacheStore};
use async_trait::async_trait;
use dashmap::DashMap;
use freestays_core::FreestaysResult;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct LocalEntry {
    value: String,
    expires_at: Instant,
}

impl LocalEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-process cache store used when Redis is not configured or not reachable.
///
/// Expired entries read as misses and are dropped when touched or by
/// [`purge_expired`](Self::purge_expired). Prefix removal is not supported:
/// [`remove_by_prefix_raw`](CacheStore::remove_by_prefix_raw) removes nothing
/// and returns 0, so prefix invalidation only takes effect on Redis.
#[derive(Debug)]
pub struct LocalCacheStore {
    entries: DashMap<String, LocalEntry>,
    default_ttl: Duration,
}

impl LocalCacheStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Number of stored entries, expired ones included until purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "Purged expired local cache entries");
        }
        purged
    }
}

#[async_trait]
impl CacheStore for LocalCacheStore {
    async fn get_raw(&self, key: &str) -> FreestaysResult<Option<String>> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FreestaysResult<()> {
        self.entries.insert(
            key.to_string(),
            LocalEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn remove_raw(&self, key: &str) -> FreestaysResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn exists_raw(&self, key: &str) -> FreestaysResult<bool> {
        Ok(self.get_raw(key).await?.is_some())
    }

    async fn remove_by_prefix_raw(&self, prefix: &str) -> FreestaysResult<u64> {
        warn!(prefix, "Prefix removal is not supported by the local cache store; nothing removed");
        Ok(0)
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStoreExt;

    fn store() -> LocalCacheStore {
        LocalCacheStore::new(Duration::from_secs(1800))
    }

    #[tokio::test]
    async fn test_set_then_get_returns_value() {
        let store = store();
        store.set("destinations:en", &vec!["Istanbul".to_string()], None).await;
        let value: Option<Vec<String>> = store.get("destinations:en").await;
        assert_eq!(value, Some(vec!["Istanbul".to_string()]));
        assert!(store.exists("destinations:en").await);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_dropped() {
        let store = store();
        store
            .set_raw("search:1", "[]", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.get_raw("search:1").await.unwrap(), None);
        assert!(!store.exists("search:1").await);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = store();
        store.set_raw("a", "1", Duration::from_millis(10)).await.unwrap();
        store.set_raw("b", "2", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = store();
        store.set_raw("hotel:1", "{}", Duration::from_secs(60)).await.unwrap();
        assert!(store.remove("hotel:1").await);
        assert!(!store.remove("hotel:1").await);
        assert_eq!(store.get_raw("hotel:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_by_prefix_leaves_keys_retrievable() {
        let store = store();
        store.set("search:1:20250601:20250605:2:0", &1, None).await;
        store.set("search:1:20250701:20250705:2:0", &2, None).await;

        assert_eq!(store.remove_by_prefix("search:1:").await, 0);

        assert_eq!(store.get::<i32>("search:1:20250601:20250605:2:0").await, Some(1));
        assert_eq!(store.get::<i32>("search:1:20250701:20250705:2:0").await, Some(2));
    }

    #[tokio::test]
    async fn test_unreadable_value_is_a_miss() {
        let store = store();
        store.set_raw("popular:all:all", "not json", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get::<Vec<i64>>("popular:all:all").await, None);
    }

    #[tokio::test]
    async fn test_set_without_ttl_uses_default() {
        let store = LocalCacheStore::new(Duration::from_millis(10));
        store.set("k", &1, None).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get::<i32>("k").await, None);
    }
}
