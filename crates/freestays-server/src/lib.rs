//! # FreeStays Server Library
//!
//! Wiring of the provider cache, sync job and scheduler, and the process
//! startup utilities.

pub mod app;
pub mod startup;
