//! # FreeStays Repository
//!
//! Durable cache tables for SunHotels static data.
//!
//! ```text
//! StaticDataSyncJob ──upsert──▶ Arc<dyn StaticDataRepository> ◀──select── StaticDataQueryService
//!                                   │
//!                     MySqlStaticDataRepository (SQLx)
//!                     InMemoryStaticDataRepository (feature "memory")
//! ```
//!
//! Rows are only ever written by the sync job, as whole-category upserts
//! keyed by (external id, language) inside one transaction. Nothing is
//! deleted.

pub mod mysql;
pub mod pool;
pub mod traits;

#[cfg(any(test, feature = "memory"))]
pub mod memory;

pub use mysql::*;
pub use pool::*;
pub use traits::*;

#[cfg(any(test, feature = "memory"))]
pub use memory::InMemoryStaticDataRepository;
