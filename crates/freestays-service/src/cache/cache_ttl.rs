//! Cache lifetimes per category, chosen by how fast the data changes.

use std::time::Duration;

/// Fallback when a caller passes no TTL.
pub const DEFAULT: Duration = Duration::from_secs(30 * 60);
/// Destination lists.
pub const DESTINATIONS: Duration = Duration::from_secs(24 * 60 * 60);
/// Resort lists.
pub const RESORTS: Duration = Duration::from_secs(12 * 60 * 60);
/// Priced, dated search results.
pub const HOTEL_SEARCH: Duration = Duration::from_secs(30 * 60);
/// Priced hotel details.
pub const HOTEL_DETAILS: Duration = Duration::from_secs(2 * 60 * 60);
/// Popular hotel lists.
pub const POPULAR_HOTELS: Duration = Duration::from_secs(6 * 60 * 60);
/// Single hotels read through from the durable tables.
pub const HOTEL_LOOKUP: Duration = Duration::from_secs(60 * 60);
