//! Transient cache for provider responses.
//!
//! [`CacheStore`] is the raw, object-safe contract with two
//! implementations. [`CacheStoreExt`] adds typed access and turns every store
//! failure into a miss or a no-op, so callers never see cache errors.
//! [`ProviderCacheService`] owns the key shapes and TTLs per category.

mod cache_store;
pub mod cache_keys;
pub mod cache_ttl;
mod local_store;
pub mod metrics;
mod provider_cache;
mod redis_store;
mod selection;

pub use cache_store::{CacheBackend, CacheStore, CacheStoreExt};
pub use local_store::LocalCacheStore;
pub use provider_cache::ProviderCacheService;
pub use redis_store::RedisCacheStore;
pub use selection::{create_redis_pool, select_cache_store};
