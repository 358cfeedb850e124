//! Static data sync: provider lists into the durable tables.

mod job;
mod mapping;
pub mod metrics;
mod report;

pub use job::StaticDataSyncJob;
pub use report::{
    CategoryReport, SyncMode, SyncOutcome, SyncReport, SyncSettings, SyncState, SyncStatus,
};
