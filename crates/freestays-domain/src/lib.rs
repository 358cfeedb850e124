//! # FreeStays Domain
//!
//! Rows of the durable provider cache tables and the hotel search types the
//! read side is queried with.
//!
//! Every cached row is keyed by the provider's external id plus a language
//! code; language variants are independent rows.

pub mod entities;
pub mod kinds;
pub mod search;

pub use entities::*;
pub use kinds::*;
pub use search::*;
