//! MySQL implementations.

mod rows;
mod static_data_repository;

pub use static_data_repository::MySqlStaticDataRepository;
