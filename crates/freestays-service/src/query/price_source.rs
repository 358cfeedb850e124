//! Live prices for the dynamic hotel search.

use async_trait::async_trait;
use freestays_core::FreestaysResult;
use freestays_domain::{HotelPrice, HotelSearchCriteria};
use std::collections::HashMap;

/// Supplies the cheapest live offer per hotel for a dated search.
///
/// Called only for criteria that carry stay dates and a destination.
/// Hotels without availability are absent from the returned map.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn hotel_prices(
        &self,
        criteria: &HotelSearchCriteria,
    ) -> FreestaysResult<HashMap<i64, HotelPrice>>;
}
