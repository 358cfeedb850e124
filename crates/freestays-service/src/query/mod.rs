//! Read-only queries over the durable static-data tables.

mod price_source;
mod static_data_query_service;

pub use price_source::PriceSource;
pub use static_data_query_service::{StaticDataQueryService, POPULAR_HOTELS_MAX};
