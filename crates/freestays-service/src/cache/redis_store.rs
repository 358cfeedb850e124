//! Redis-backed cache store.

use super::{CacheBackend, CacheStore};
use async_trait::async_trait;
use deadpool_redis::{
    redis::{self, AsyncCommands},
    Pool,
};
use freestays_core::{FreestaysError, FreestaysResult};
use std::time::Duration;
use tracing::debug;

/// Keys examined per `SCAN` round trip during prefix removal.
const SCAN_BATCH: usize = 500;

/// Escapes glob metacharacters so a key prefix matches literally in `SCAN MATCH`.
fn escape_glob(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Cache store on a shared Redis instance.
///
/// Every key is stored under `instance_name`, so several deployments can
/// share one Redis.
pub struct RedisCacheStore {
    pool: Pool,
    instance_name: String,
    default_ttl: Duration,
}

impl RedisCacheStore {
    /// Creates a store on an existing pool.
    #[must_use]
    pub fn new(pool: Pool, instance_name: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            pool,
            instance_name: instance_name.into(),
            default_ttl,
        }
    }

    fn qualify(&self, key: &str) -> String {
        format!("{}{}", self.instance_name, key)
    }

    async fn get_conn(&self) -> FreestaysResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| FreestaysError::Cache(format!("Failed to get Redis connection: {}", e)))
    }

    /// Round-trips a `PING`.
    pub async fn ping(&self) -> FreestaysResult<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| FreestaysError::Cache(format!("Redis PING failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get_raw(&self, key: &str) -> FreestaysResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        conn.get(self.qualify(key))
            .await
            .map_err(|e| FreestaysError::Cache(format!("Failed to get key '{}': {}", key, e)))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FreestaysResult<()> {
        let mut conn = self.get_conn().await?;
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.qualify(key), value, ttl_secs)
            .await
            .map_err(|e| FreestaysError::Cache(format!("Failed to set key '{}': {}", key, e)))
    }

    async fn remove_raw(&self, key: &str) -> FreestaysResult<bool> {
        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(self.qualify(key))
            .await
            .map_err(|e| FreestaysError::Cache(format!("Failed to delete key '{}': {}", key, e)))?;
        Ok(deleted > 0)
    }

    async fn exists_raw(&self, key: &str) -> FreestaysResult<bool> {
        let mut conn = self.get_conn().await?;
        conn.exists(self.qualify(key))
            .await
            .map_err(|e| FreestaysError::Cache(format!("Failed to check key '{}': {}", key, e)))
    }

    async fn remove_by_prefix_raw(&self, prefix: &str) -> FreestaysResult<u64> {
        let mut conn = self.get_conn().await?;
        let pattern = format!("{}*", escape_glob(&self.qualify(prefix)));

        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await
                .map_err(|e| FreestaysError::Cache(format!("Failed to scan '{}': {}", pattern, e)))?;

            if !keys.is_empty() {
                let deleted: u64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| FreestaysError::Cache(format!("Failed to delete keys: {}", e)))?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(prefix, removed, "Removed cache keys by prefix");
        Ok(removed)
    }

    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Redis
    }
}
