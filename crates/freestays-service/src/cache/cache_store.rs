//! Cache store trait and its typed, failure-swallowing extension.

use super::metrics::CacheMetrics;
use async_trait::async_trait;
use freestays_core::FreestaysResult;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};

/// Which implementation backs a [`CacheStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// Shared Redis instance.
    Redis,
    /// Process-local map.
    Local,
}

impl CacheBackend {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value store of JSON strings with a TTL per key.
///
/// Implementations report their failures; [`CacheStoreExt`] is the layer that
/// hides them from callers.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` if absent or expired.
    async fn get_raw(&self, key: &str) -> FreestaysResult<Option<String>>;

    /// Stores a value for `ttl`.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FreestaysResult<()>;

    /// Removes a key. Returns `true` if it existed.
    async fn remove_raw(&self, key: &str) -> FreestaysResult<bool>;

    /// Returns `true` if the key is present and not expired.
    async fn exists_raw(&self, key: &str) -> FreestaysResult<bool>;

    /// Removes every key starting with `prefix`. Returns how many were removed.
    async fn remove_by_prefix_raw(&self, prefix: &str) -> FreestaysResult<u64>;

    /// TTL applied by [`CacheStoreExt::set`] when the caller passes none.
    fn default_ttl(&self) -> Duration;

    /// The implementation behind this store.
    fn backend(&self) -> CacheBackend;
}

fn record_failure(backend: CacheBackend, operation: &'static str, key: &str, message: &str) {
    error!(backend = %backend, operation, key, "Cache store failure: {}", message);
    CacheMetrics::error(backend, operation);
}

/// Typed cache access.
///
/// Nothing here returns a cache error: a failing store reads as a miss and
/// writes as a no-op, and values that no longer deserialize are misses.
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// Reads and deserializes a value.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        let backend = self.backend();
        let raw = match self.get_raw(key).await {
            Ok(raw) => raw,
            Err(e) => {
                record_failure(backend, "get", key, &e.to_string());
                None
            }
        };

        let value = raw.and_then(|json| match serde_json::from_str::<T>(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                record_failure(backend, "deserialize", key, &e.to_string());
                None
            }
        });

        if value.is_some() {
            debug!(key, "Cache hit");
            CacheMetrics::hit(backend);
        } else {
            debug!(key, "Cache miss");
            CacheMetrics::miss(backend);
        }
        value
    }

    /// Serializes and stores a value. `None` uses the store's default TTL.
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let backend = self.backend();
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                record_failure(backend, "serialize", key, &e.to_string());
                return;
            }
        };
        let ttl = ttl.unwrap_or_else(|| self.default_ttl());
        match self.set_raw(key, &json, ttl).await {
            Ok(()) => debug!(key, ttl_secs = ttl.as_secs(), "Cached value"),
            Err(e) => record_failure(backend, "set", key, &e.to_string()),
        }
    }

    /// Removes a key; `false` when absent or when the store failed.
    async fn remove(&self, key: &str) -> bool {
        self.remove_raw(key).await.unwrap_or_else(|e| {
            record_failure(self.backend(), "remove", key, &e.to_string());
            false
        })
    }

    /// Checks a key; `false` when the store failed.
    async fn exists(&self, key: &str) -> bool {
        self.exists_raw(key).await.unwrap_or_else(|e| {
            record_failure(self.backend(), "exists", key, &e.to_string());
            false
        })
    }

    /// Removes every key under `prefix`; `0` when the store failed.
    async fn remove_by_prefix(&self, prefix: &str) -> u64 {
        self.remove_by_prefix_raw(prefix).await.unwrap_or_else(|e| {
            record_failure(self.backend(), "remove_by_prefix", prefix, &e.to_string());
            0
        })
    }

    /// Returns the cached value or computes, caches and returns it.
    ///
    /// Only `factory` errors are returned.
    async fn get_or_set<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> FreestaysResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = FreestaysResult<T>> + Send,
    {
        if let Some(cached) = self.get::<T>(key).await {
            return Ok(cached);
        }
        let value = factory().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
