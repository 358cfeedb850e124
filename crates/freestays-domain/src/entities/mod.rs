//! Durable cache-table rows.

mod destination;
mod hotel;
mod reference;
mod resort;
mod room;

pub use destination::*;
pub use hotel::*;
pub use reference::*;
pub use resort::*;
pub use room::*;

use chrono::{DateTime, Duration, Utc};

/// A row written by the sync job.
pub trait SyncedRow {
    /// When the sync job last wrote this row.
    fn last_synced_at(&self) -> DateTime<Utc>;

    /// Returns true if the row is older than `max_age` at `now`.
    ///
    /// Informational only: stale rows are still served.
    fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.last_synced_at()) > max_age
    }
}

macro_rules! impl_synced_row {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl SyncedRow for $ty {
                fn last_synced_at(&self) -> DateTime<Utc> {
                    self.last_synced_at
                }
            }
        )+
    };
}

impl_synced_row!(Destination, Resort, Hotel, Room, ReferenceItem);
