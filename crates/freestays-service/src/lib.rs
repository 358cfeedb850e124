//! # FreeStays Service
//!
//! The provider cache and orchestration layer:
//!
//! - [`cache`]: transient key/value store (Redis or process-local) and the
//!   key/TTL policy for provider responses
//! - [`sync`]: the job that copies SunHotels static data into the durable tables
//! - [`query`]: read-only facade over the durable tables, including the
//!   advanced hotel search
//! - [`booking`]: search, pre-book and book against the provider
//!
//! ```text
//! Scheduler ──► StaticDataSyncJob ──► StaticDataRepository ◄── StaticDataQueryService
//!                      │                                              │
//!               StaticDataProvider                              PriceSource
//!                                                                     │
//!                BookingProvider ◄── BookingService ──► ProviderCacheService ──► CacheStore
//! ```
//!
//! Collaborators are passed to constructors as `Arc<dyn Trait>`.

pub mod booking;
pub mod cache;
pub mod query;
pub mod sync;

pub use booking::BookingService;
pub use cache::{
    create_redis_pool, select_cache_store, CacheBackend, CacheStore, CacheStoreExt,
    LocalCacheStore, ProviderCacheService, RedisCacheStore,
};
pub use query::{PriceSource, StaticDataQueryService, POPULAR_HOTELS_MAX};
pub use sync::{
    CategoryReport, StaticDataSyncJob, SyncMode, SyncOutcome, SyncReport, SyncSettings, SyncState,
    SyncStatus,
};
