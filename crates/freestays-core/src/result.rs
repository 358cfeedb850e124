//! Result type aliases for FreeStays.

use crate::FreestaysError;

/// A specialized `Result` type for FreeStays operations.
pub type FreestaysResult<T> = Result<T, FreestaysError>;
