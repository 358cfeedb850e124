//! Startup choice between the Redis and the local cache store.

use super::{CacheStore, LocalCacheStore, RedisCacheStore};
use deadpool_redis::{Config, Pool, Runtime};
use freestays_config::RedisConfig;
use freestays_core::{FreestaysError, FreestaysResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds a Redis connection pool without connecting.
pub fn create_redis_pool(config: &RedisConfig) -> FreestaysResult<Pool> {
    Config::from_url(&config.url)
        .builder()
        .map_err(|e| FreestaysError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size as usize)
        .wait_timeout(Some(config.connect_timeout()))
        .create_timeout(Some(config.connect_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| FreestaysError::Configuration(format!("Failed to create Redis pool: {}", e)))
}

/// Picks the cache store once, at startup.
///
/// Redis is used when it is configured and answers a `PING` within the
/// connect timeout. Otherwise the process-local store is returned; the
/// application keeps working without Redis.
pub async fn select_cache_store(config: &RedisConfig, default_ttl: Duration) -> Arc<dyn CacheStore> {
    if !config.is_configured() {
        info!("Redis not configured; using the local cache store");
        return Arc::new(LocalCacheStore::new(default_ttl));
    }

    let pool = match create_redis_pool(config) {
        Ok(pool) => pool,
        Err(e) => {
            warn!(error = %e, "Redis pool could not be built; using the local cache store");
            return Arc::new(LocalCacheStore::new(default_ttl));
        }
    };

    let store = RedisCacheStore::new(pool, config.instance_name.clone(), default_ttl);
    match tokio::time::timeout(config.connect_timeout(), store.ping()).await {
        Ok(Ok(())) => {
            info!(instance = %config.instance_name, "Using the Redis cache store");
            Arc::new(store)
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Redis unreachable; using the local cache store");
            Arc::new(LocalCacheStore::new(default_ttl))
        }
        Err(_) => {
            warn!(
                timeout_secs = config.connect_timeout_secs,
                "Redis did not answer in time; using the local cache store"
            );
            Arc::new(LocalCacheStore::new(default_ttl))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBackend;

    #[tokio::test]
    async fn test_not_configured_selects_local() {
        let config = RedisConfig {
            enabled: false,
            ..RedisConfig::default()
        };
        let store = select_cache_store(&config, Duration::from_secs(1800)).await;
        assert_eq!(store.backend(), CacheBackend::Local);
        assert_eq!(store.default_ttl(), Duration::from_secs(1800));
    }

    #[tokio::test]
    async fn test_blank_url_selects_local() {
        let config = RedisConfig {
            url: String::new(),
            ..RedisConfig::default()
        };
        let store = select_cache_store(&config, Duration::from_secs(60)).await;
        assert_eq!(store.backend(), CacheBackend::Local);
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_local() {
        let config = RedisConfig {
            url: "redis://127.0.0.1:9".to_string(),
            connect_timeout_secs: 1,
            ..RedisConfig::default()
        };
        let store = select_cache_store(&config, Duration::from_secs(60)).await;
        assert_eq!(store.backend(), CacheBackend::Local);
    }

    #[test]
    fn test_invalid_url_is_a_configuration_error() {
        let config = RedisConfig {
            url: "not a url".to_string(),
            ..RedisConfig::default()
        };
        assert!(matches!(
            create_redis_pool(&config),
            Err(FreestaysError::Configuration(_))
        ));
    }
}
