//! # FreeStays Config
//!
//! Configuration management for the FreeStays provider cache layer.
//! Supports layered configuration from TOML files and `FREESTAYS__*`
//! environment variables, validated once at startup.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
