//! # FreeStays Core
//!
//! Foundational types shared by every FreeStays crate: the unified error
//! type, pagination primitives, the language code used to key every cached
//! row, and request validation helpers.

pub mod error;
pub mod language;
pub mod pagination;
pub mod result;
pub mod validation;

pub use error::*;
pub use language::*;
pub use pagination::*;
pub use result::*;
pub use validation::*;
