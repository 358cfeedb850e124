//! # FreeStays Provider
//!
//! Contracts of the SunHotels inventory provider and the HTTP client that
//! implements them.
//!
//! Static data (destinations, resorts, lookups, hotels, rooms) is fetched
//! whole per language by the sync job. Search, pre-book and book are live
//! calls made on behalf of a user.

pub mod client;
pub mod dto;
pub mod traits;

pub use client::SunHotelsClient;
pub use dto::*;
pub use traits::*;

/// Provider name used in errors, logs and metrics.
pub const PROVIDER_NAME: &str = "sunhotels";
