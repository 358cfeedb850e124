//! Query facade over the durable static-data tables.

use super::PriceSource;
use crate::cache::{cache_keys, cache_ttl, CacheStoreExt, ProviderCacheService};
use freestays_core::{FreestaysResult, LanguageCode, Page, PageRequest, ValidateExt};
use freestays_domain::{
    Destination, Hotel, HotelFilter, HotelPrice, HotelSearchCriteria, HotelSearchEnvelope,
    HotelSearchHit, ReferenceItem, ReferenceKind, Resort, Room, SearchType, SortBy,
    PRICE_MESSAGE_NO_AVAILABILITY, PRICE_MESSAGE_SELECT_DATES,
};
use freestays_repository::StaticDataRepository;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Most hotels kept in one cached popular list.
pub const POPULAR_HOTELS_MAX: usize = 50;

/// Read-only facade over the static-data tables.
///
/// Absent ids are `None` or an empty list, never an error. Blank search terms
/// match nothing.
#[derive(Clone)]
pub struct StaticDataQueryService {
    repository: Arc<dyn StaticDataRepository>,
    cache: ProviderCacheService,
    hotel_lookup_ttl: Duration,
}

impl StaticDataQueryService {
    /// Creates the service.
    #[must_use]
    pub fn new(repository: Arc<dyn StaticDataRepository>, cache: ProviderCacheService) -> Self {
        Self {
            repository,
            cache,
            hotel_lookup_ttl: cache_ttl::HOTEL_LOOKUP,
        }
    }

    /// Overrides how long hotels read through [`hotels_by_ids`](Self::hotels_by_ids) stay cached.
    #[must_use]
    pub fn with_hotel_lookup_ttl(mut self, ttl: Duration) -> Self {
        self.hotel_lookup_ttl = ttl;
        self
    }

    // ============ Destinations ============

    pub async fn destinations(&self, language: &LanguageCode) -> FreestaysResult<Vec<Destination>> {
        self.repository.find_destinations(language).await
    }

    pub async fn destination(
        &self,
        id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<Destination>> {
        self.repository.find_destination(id, language).await
    }

    pub async fn search_destinations(
        &self,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Destination>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.repository.search_destinations(term.trim(), language).await
    }

    // ============ Resorts ============

    pub async fn resorts(&self, language: &LanguageCode) -> FreestaysResult<Vec<Resort>> {
        self.repository.find_resorts(language).await
    }

    pub async fn resort(&self, id: i64, language: &LanguageCode) -> FreestaysResult<Option<Resort>> {
        self.repository.find_resort(id, language).await
    }

    pub async fn resorts_by_destination(
        &self,
        destination_id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Resort>> {
        self.repository
            .find_resorts_by_destination(destination_id, language)
            .await
    }

    pub async fn search_resorts(
        &self,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Resort>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.repository.search_resorts(term.trim(), language).await
    }

    // ============ Reference lists ============

    pub async fn reference_items(
        &self,
        kind: ReferenceKind,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>> {
        self.repository.find_reference_items(kind, language).await
    }

    pub async fn reference_item(
        &self,
        kind: ReferenceKind,
        id: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<ReferenceItem>> {
        self.repository.find_reference_item(kind, id, language).await
    }

    pub async fn search_reference_items(
        &self,
        kind: ReferenceKind,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.repository
            .search_reference_items(kind, term.trim(), language)
            .await
    }

    // ============ Hotels ============

    pub async fn hotel(&self, id: i64, language: &LanguageCode) -> FreestaysResult<Option<Hotel>> {
        self.repository.find_hotel(id, language).await
    }

    /// Hotels in the order of `ids`, read through the transient cache.
    ///
    /// Unknown and repeated ids are skipped.
    pub async fn hotels_by_ids(&self, ids: &[i64], language: &LanguageCode) -> FreestaysResult<Vec<Hotel>> {
        let ids = distinct(ids);
        let store = self.cache.store();

        let mut found: HashMap<i64, Hotel> = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in &ids {
            match store.get::<Hotel>(&cache_keys::static_hotel(*id, language)).await {
                Some(hotel) => {
                    found.insert(*id, hotel);
                }
                None => missing.push(*id),
            }
        }

        if !missing.is_empty() {
            debug!(requested = ids.len(), missing = missing.len(), "Loading hotels from the durable tables");
            for hotel in self.repository.find_hotels_by_ids(&missing, language).await? {
                store
                    .set(
                        &cache_keys::static_hotel(hotel.external_id, language),
                        &hotel,
                        Some(self.hotel_lookup_ttl),
                    )
                    .await;
                found.insert(hotel.external_id, hotel);
            }
        }

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    /// Same as [`hotels_by_ids`](Self::hotels_by_ids) without touching the cache.
    pub async fn hotels_by_ids_direct(
        &self,
        ids: &[i64],
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Hotel>> {
        let ids = distinct(ids);
        let mut found: HashMap<i64, Hotel> = self
            .repository
            .find_hotels_by_ids(&ids, language)
            .await?
            .into_iter()
            .map(|hotel| (hotel.external_id, hotel))
            .collect();
        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    pub async fn hotels_paginated(
        &self,
        filter: &HotelFilter,
        page: PageRequest,
    ) -> FreestaysResult<Page<Hotel>> {
        self.repository.find_hotels(filter, page).await
    }

    /// Hotels whose name, city or address contains `term`.
    pub async fn search_hotels(
        &self,
        term: &str,
        language: &LanguageCode,
        page: PageRequest,
    ) -> FreestaysResult<Page<Hotel>> {
        if term.trim().is_empty() {
            return Ok(Page::empty(page));
        }
        let filter = HotelFilter::new(language.clone()).with_text(term.trim());
        self.repository.find_hotels(&filter, page).await
    }

    pub async fn rooms_for_hotel(&self, hotel_id: i64, language: &LanguageCode) -> FreestaysResult<Vec<Room>> {
        self.repository.find_rooms_by_hotel(hotel_id, language).await
    }

    /// Best-rated hotels of a destination in the default language, cached for 6 hours.
    ///
    /// `stars` is a minimum star category.
    pub async fn popular_hotels(
        &self,
        destination_id: Option<i64>,
        stars: Option<u8>,
        limit: usize,
    ) -> FreestaysResult<Vec<Hotel>> {
        let destination_key = destination_id.map(|id| id.to_string());
        let destination_key = destination_key.as_deref();

        if let Some(mut cached) = self.cache.get_popular_hotels(destination_key, stars).await {
            cached.truncate(limit);
            return Ok(cached);
        }

        let mut filter = HotelFilter::new(LanguageCode::default());
        filter.destination_id = destination_id;
        filter.min_stars = stars.map(f32::from);

        let mut hotels = self.repository.find_all_hotels(&filter).await?;
        hotels.sort_by(|a, b| compare_stars(b, a).then_with(|| a.name.cmp(&b.name)));
        hotels.truncate(POPULAR_HOTELS_MAX);

        self.cache
            .set_popular_hotels(destination_key, stars, &hotels)
            .await;

        hotels.truncate(limit);
        Ok(hotels)
    }

    // ============ Advanced search ============

    /// Multi-criteria hotel search.
    ///
    /// Scalar criteria are answered by the repository. Theme and feature
    /// lists, the geo radius, meal types and the price range are applied to
    /// the loaded rows. With stay dates, a destination and a price source the
    /// search is dynamic and results carry live prices; otherwise it is
    /// static and every result asks for dates.
    pub async fn advanced_search(
        &self,
        criteria: &HotelSearchCriteria,
        prices: Option<&dyn PriceSource>,
    ) -> FreestaysResult<HotelSearchEnvelope> {
        criteria.validate_request()?;

        let hotels = self.repository.find_all_hotels(&criteria.to_filter()).await?;
        let loaded = hotels.len();
        let reference = criteria.reference_point();

        let candidates: Vec<(Hotel, Option<f64>)> = hotels
            .into_iter()
            .filter(|h| h.has_all_themes(&criteria.theme_ids) && h.has_all_features(&criteria.feature_ids))
            .filter_map(|hotel| {
                let distance = reference
                    .as_ref()
                    .and_then(|point| hotel.location().map(|location| point.distance_km(&location)));
                match criteria.max_distance_km {
                    Some(max) if reference.is_some() => match distance {
                        Some(km) if km <= max => Some((hotel, distance)),
                        _ => None,
                    },
                    _ => Some((hotel, distance)),
                }
            })
            .collect();

        let (search_type, mut hits) = match prices {
            Some(source) if criteria.wants_pricing() => {
                let prices = source.hotel_prices(criteria).await?;
                (SearchType::Dynamic, priced_hits(criteria, candidates, &prices))
            }
            _ => {
                if !criteria.meal_ids.is_empty() || criteria.min_price.is_some() || criteria.max_price.is_some() {
                    debug!("Meal and price filters need stay dates; ignored for a static search");
                }
                let hits = candidates
                    .into_iter()
                    .map(|(hotel, distance)| HotelSearchHit::unpriced(hotel, distance, PRICE_MESSAGE_SELECT_DATES))
                    .collect();
                (SearchType::Static, hits)
            }
        };

        sort_hits(&mut hits, criteria.sort_by);
        debug!(
            search_type = ?search_type,
            loaded,
            matched = hits.len(),
            "Advanced hotel search"
        );

        let page = Page::from_all(hits, criteria.page_request());
        Ok(HotelSearchEnvelope::from_page(search_type, page))
    }
}

fn distinct(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn compare_stars(a: &Hotel, b: &Hotel) -> Ordering {
    a.star_category
        .unwrap_or(0.0)
        .total_cmp(&b.star_category.unwrap_or(0.0))
}

fn in_price_range(criteria: &HotelSearchCriteria, price: f64) -> bool {
    criteria.min_price.map_or(true, |min| price >= min) && criteria.max_price.map_or(true, |max| price <= max)
}

fn priced_hits(
    criteria: &HotelSearchCriteria,
    candidates: Vec<(Hotel, Option<f64>)>,
    prices: &HashMap<i64, HotelPrice>,
) -> Vec<HotelSearchHit> {
    let needs_price =
        !criteria.meal_ids.is_empty() || criteria.min_price.is_some() || criteria.max_price.is_some();

    candidates
        .into_iter()
        .filter_map(|(hotel, distance)| match prices.get(&hotel.external_id) {
            Some(price) => {
                let meal_ok = criteria.meal_ids.is_empty()
                    || price.meal_ids.iter().any(|meal| criteria.meal_ids.contains(meal));
                (meal_ok && in_price_range(criteria, price.min_price))
                    .then(|| HotelSearchHit::priced(hotel, distance, price))
            }
            None if needs_price => None,
            None => Some(HotelSearchHit::unpriced(
                hotel,
                distance,
                PRICE_MESSAGE_NO_AVAILABILITY,
            )),
        })
        .collect()
}

fn sort_hits(hits: &mut [HotelSearchHit], sort_by: SortBy) {
    let by_name = |a: &HotelSearchHit, b: &HotelSearchHit| a.hotel.name.cmp(&b.hotel.name);
    // Missing values sort last in either direction.
    let optional = |a: Option<f64>, b: Option<f64>, descending: bool| match (a, b) {
        (Some(a), Some(b)) if descending => b.total_cmp(&a),
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    match sort_by {
        SortBy::Relevance => hits.sort_by(by_name),
        SortBy::StarsDesc => hits.sort_by(|a, b| compare_stars(&b.hotel, &a.hotel).then_with(|| by_name(a, b))),
        SortBy::StarsAsc => hits.sort_by(|a, b| compare_stars(&a.hotel, &b.hotel).then_with(|| by_name(a, b))),
        SortBy::PriceAsc => hits.sort_by(|a, b| optional(a.min_price, b.min_price, false).then_with(|| by_name(a, b))),
        SortBy::PriceDesc => hits.sort_by(|a, b| optional(a.min_price, b.min_price, true).then_with(|| by_name(a, b))),
        SortBy::Distance => {
            hits.sort_by(|a, b| optional(a.distance_km, b.distance_km, false).then_with(|| by_name(a, b)));
        }
    }
}
