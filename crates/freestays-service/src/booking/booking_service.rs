//! Search, pre-book and book against the provider.

use crate::cache::ProviderCacheService;
use crate::query::PriceSource;
use async_trait::async_trait;
use freestays_core::{FreestaysResult, LanguageCode, ValidateExt};
use freestays_domain::{HotelPrice, HotelSearchCriteria};
use freestays_provider::{
    BookRequest, BookingConfirmation, BookingProvider, HotelDetails, HotelDetailsRequest,
    HotelOffer, HotelSearchRequest, PreBookRequest, PreBookResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Booking flow on top of the live provider.
///
/// Searches and hotel details are cached (30 minutes and 2 hours); pre-book
/// and book always go to the provider. Searches in a non-default currency or
/// language are never cached. A confirmed booking drops the cached
/// details of its hotel.
#[derive(Clone)]
pub struct BookingService {
    provider: Arc<dyn BookingProvider>,
    cache: ProviderCacheService,
    currency: Option<String>,
}

impl BookingService {
    /// Creates the service.
    #[must_use]
    pub fn new(provider: Arc<dyn BookingProvider>, cache: ProviderCacheService) -> Self {
        Self {
            provider,
            cache,
            currency: None,
        }
    }

    /// Currency requested when a search does not name one.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Priced availability for a destination and stay.
    pub async fn search(&self, request: &HotelSearchRequest) -> FreestaysResult<Vec<HotelOffer>> {
        request.validate_request()?;
        let cacheable = self.shares_search_cache(request);

        if !cacheable {
            debug!(
                destination_id = %request.destination_id,
                "Search names a non-default currency or language; bypassing cache"
            );
        } else if let Some(offers) = self
            .cache
            .get_hotel_search(
                &request.destination_id,
                request.check_in,
                request.check_out,
                request.adults,
                request.children,
            )
            .await
        {
            return Ok(offers);
        }

        let mut request = request.clone();
        if request.currency.is_none() {
            request.currency.clone_from(&self.currency);
        }
        let offers = self.provider.search_hotels(&request).await?;
        debug!(
            destination_id = %request.destination_id,
            offers = offers.len(),
            "Fetched hotel offers from provider"
        );

        if cacheable {
            self.cache
                .set_hotel_search(
                    &request.destination_id,
                    request.check_in,
                    request.check_out,
                    request.adults,
                    request.children,
                    &offers,
                )
                .await;
        }
        Ok(offers)
    }

    /// Search keys carry neither currency nor language, so only searches in
    /// the default ones may read or fill the cache.
    fn shares_search_cache(&self, request: &HotelSearchRequest) -> bool {
        let default_currency = request.currency.is_none() || request.currency == self.currency;
        default_currency && request.language == LanguageCode::default()
    }

    /// Priced details of one hotel; `None` if the provider does not know it.
    pub async fn hotel_details(
        &self,
        request: &HotelDetailsRequest,
    ) -> FreestaysResult<Option<HotelDetails>> {
        request.validate_request()?;

        if let Some(details) = self
            .cache
            .get_hotel_details(
                &request.hotel_id,
                request.check_in,
                request.check_out,
                request.adults,
            )
            .await
        {
            return Ok(Some(details));
        }

        let details = self.provider.hotel_details(request).await?;
        if let Some(details) = &details {
            self.cache
                .set_hotel_details(
                    &request.hotel_id,
                    request.check_in,
                    request.check_out,
                    request.adults,
                    details,
                )
                .await;
        }
        Ok(details)
    }

    /// Locks the price of one offer.
    pub async fn pre_book(&self, request: &PreBookRequest) -> FreestaysResult<PreBookResult> {
        request.validate_request()?;

        let result = self.provider.pre_book(request).await?;
        if result.price_changed {
            warn!(
                hotel_id = %request.hotel_id,
                room_id = %request.room_id,
                expected = request.expected_price,
                actual = result.price,
                "Price changed at pre-book"
            );
        }
        Ok(result)
    }

    /// Confirms a pre-booked offer.
    pub async fn book(&self, request: &BookRequest) -> FreestaysResult<BookingConfirmation> {
        request.validate_request()?;

        let confirmation = self.provider.book(request).await?;
        info!(
            hotel_id = %request.hotel_id,
            booking_number = %confirmation.booking_number,
            status = %confirmation.status,
            "Booking confirmed"
        );

        self.cache.invalidate_hotel_details(&request.hotel_id).await;
        Ok(confirmation)
    }

    fn search_request(&self, criteria: &HotelSearchCriteria) -> Option<HotelSearchRequest> {
        let destination_id = criteria.destination_id?;
        let (check_in, check_out) = criteria.stay()?;
        Some(HotelSearchRequest {
            destination_id: destination_id.to_string(),
            check_in,
            check_out,
            adults: criteria.effective_adults(),
            children: criteria.children,
            children_ages: criteria.children_ages.clone(),
            language: criteria.language.clone(),
            currency: self.currency.clone(),
        })
    }
}

/// Cheapest room of an offer, restricted to `meal_ids` when any are given.
fn offer_price(offer: &HotelOffer, meal_ids: &[i64]) -> Option<HotelPrice> {
    let hotel_id = offer.hotel_id.trim().parse::<i64>().ok()?;
    let meal_of = |meal: &Option<String>| meal.as_deref().and_then(|m| m.trim().parse::<i64>().ok());

    let rooms: Vec<_> = offer
        .rooms
        .iter()
        .filter(|room| room.price.is_finite())
        .filter(|room| meal_ids.is_empty() || meal_of(&room.meal_id).is_some_and(|m| meal_ids.contains(&m)))
        .collect();

    let cheapest = rooms.iter().min_by(|a, b| a.price.total_cmp(&b.price))?;
    let mut offered_meals: Vec<i64> = rooms.iter().filter_map(|room| meal_of(&room.meal_id)).collect();
    offered_meals.sort_unstable();
    offered_meals.dedup();

    Some(HotelPrice {
        hotel_id,
        min_price: cheapest.price,
        currency: cheapest.currency.clone(),
        meal_ids: offered_meals,
    })
}

#[async_trait]
impl PriceSource for BookingService {
    async fn hotel_prices(
        &self,
        criteria: &HotelSearchCriteria,
    ) -> FreestaysResult<HashMap<i64, HotelPrice>> {
        let Some(request) = self.search_request(criteria) else {
            return Ok(HashMap::new());
        };

        let offers = self.search(&request).await?;
        let mut prices: HashMap<i64, HotelPrice> = HashMap::new();
        for price in offers.iter().filter_map(|offer| offer_price(offer, &criteria.meal_ids)) {
            match prices.get(&price.hotel_id) {
                Some(existing) if existing.min_price <= price.min_price => {}
                _ => {
                    prices.insert(price.hotel_id, price);
                }
            }
        }
        Ok(prices)
    }
}
