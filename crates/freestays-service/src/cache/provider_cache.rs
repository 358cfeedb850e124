//! Typed cache of provider responses.

use super::{cache_keys, cache_ttl, CacheBackend, CacheStore, CacheStoreExt};
use chrono::NaiveDate;
use freestays_core::LanguageCode;
use freestays_domain::Hotel;
use freestays_provider::{DestinationDto, HotelDetails, HotelOffer, ResortDto};
use std::sync::Arc;
use tracing::{info, warn};

/// Reads and writes provider responses under deterministic keys with a fixed
/// TTL per category.
///
/// Every operation degrades to a miss or a no-op when the store fails.
#[derive(Clone)]
pub struct ProviderCacheService {
    store: Arc<dyn CacheStore>,
}

impl ProviderCacheService {
    /// Creates the service on a store.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    // ============ Destinations ============

    /// Cached destination list for one language.
    pub async fn get_destinations(&self, language: &LanguageCode) -> Option<Vec<DestinationDto>> {
        self.store.get(&cache_keys::destinations(language)).await
    }

    /// Caches the destination list for one language.
    pub async fn set_destinations(&self, destinations: &[DestinationDto], language: &LanguageCode) {
        self.store
            .set(
                &cache_keys::destinations(language),
                &destinations,
                Some(cache_ttl::DESTINATIONS),
            )
            .await;
    }

    // ============ Resorts ============

    /// Cached resorts for one language, optionally narrowed to a destination.
    pub async fn get_resorts(
        &self,
        language: &LanguageCode,
        destination_id: Option<&str>,
    ) -> Option<Vec<ResortDto>> {
        self.store
            .get(&cache_keys::resorts(language, destination_id))
            .await
    }

    /// Caches resorts; a `None` destination is its own entry, not a union.
    pub async fn set_resorts(
        &self,
        resorts: &[ResortDto],
        language: &LanguageCode,
        destination_id: Option<&str>,
    ) {
        self.store
            .set(
                &cache_keys::resorts(language, destination_id),
                &resorts,
                Some(cache_ttl::RESORTS),
            )
            .await;
    }

    // ============ Hotel search ============

    /// Cached offers of one search, keyed as [`cache_keys::hotel_search`].
    pub async fn get_hotel_search(
        &self,
        destination_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: u32,
        children: u32,
    ) -> Option<Vec<HotelOffer>> {
        let key = cache_keys::hotel_search(destination_id, check_in, check_out, adults, children);
        self.store.get(&key).await
    }

    /// Caches the offers of one search.
    pub async fn set_hotel_search(
        &self,
        destination_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: u32,
        children: u32,
        offers: &[HotelOffer],
    ) {
        let key = cache_keys::hotel_search(destination_id, check_in, check_out, adults, children);
        self.store
            .set(&key, &offers, Some(cache_ttl::HOTEL_SEARCH))
            .await;
    }

    // ============ Hotel details ============

    /// Cached details of one hotel for a stay.
    pub async fn get_hotel_details(
        &self,
        hotel_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: u32,
    ) -> Option<HotelDetails> {
        let key = cache_keys::hotel_details(hotel_id, check_in, check_out, adults);
        self.store.get(&key).await
    }

    /// Caches the details of one hotel for a stay.
    pub async fn set_hotel_details(
        &self,
        hotel_id: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        adults: u32,
        details: &HotelDetails,
    ) {
        let key = cache_keys::hotel_details(hotel_id, check_in, check_out, adults);
        self.store
            .set(&key, details, Some(cache_ttl::HOTEL_DETAILS))
            .await;
    }

    // ============ Popular hotels ============

    /// Cached popular hotels, optionally by destination and star rating.
    pub async fn get_popular_hotels(
        &self,
        destination_id: Option<&str>,
        stars: Option<u8>,
    ) -> Option<Vec<Hotel>> {
        self.store
            .get(&cache_keys::popular_hotels(destination_id, stars))
            .await
    }

    /// Caches a popular hotels list.
    pub async fn set_popular_hotels(
        &self,
        destination_id: Option<&str>,
        stars: Option<u8>,
        hotels: &[Hotel],
    ) {
        self.store
            .set(
                &cache_keys::popular_hotels(destination_id, stars),
                &hotels,
                Some(cache_ttl::POPULAR_HOTELS),
            )
            .await;
    }

    // ============ Invalidation ============

    /// Drops every cached search of one destination.
    pub async fn invalidate_destination_searches(&self, destination_id: &str) -> u64 {
        self.invalidate_prefix(&cache_keys::destination_searches_prefix(destination_id))
            .await
    }

    /// Drops every cached details entry of one hotel.
    pub async fn invalidate_hotel_details(&self, hotel_id: &str) -> u64 {
        self.invalidate_prefix(&cache_keys::hotel_details_prefix(hotel_id))
            .await
    }

    /// Drops every cached search.
    pub async fn invalidate_all_searches(&self) -> u64 {
        self.invalidate_prefix(&cache_keys::all_searches_prefix())
            .await
    }

    async fn invalidate_prefix(&self, prefix: &str) -> u64 {
        let removed = self.store.remove_by_prefix(prefix).await;
        match self.store.backend() {
            CacheBackend::Redis => info!(prefix, removed, "Invalidated cached entries"),
            CacheBackend::Local => warn!(
                prefix,
                "Local cache store cannot invalidate by prefix; entries expire by TTL"
            ),
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalCacheStore;
    use freestays_provider::RoomOffer;
    use std::time::Duration;

    fn service() -> ProviderCacheService {
        ProviderCacheService::new(Arc::new(LocalCacheStore::new(cache_ttl::DEFAULT)))
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn offer(hotel_id: &str, price: f64) -> HotelOffer {
        HotelOffer {
            hotel_id: hotel_id.to_string(),
            name: format!("Hotel {}", hotel_id),
            rooms: vec![RoomOffer {
                room_id: "r1".to_string(),
                room_type_id: Some("2".to_string()),
                name: "Double".to_string(),
                meal_id: Some("1".to_string()),
                price,
                currency: "EUR".to_string(),
                is_refundable: true,
            }],
        }
    }

    #[tokio::test]
    async fn test_set_then_get_destinations() {
        let cache = service();
        let en = LanguageCode::default();
        let istanbul = DestinationDto {
            id: "1".to_string(),
            name: "Istanbul".to_string(),
            ..DestinationDto::default()
        };

        cache.set_destinations(&[istanbul], &en).await;
        let cached = cache.get_destinations(&en).await.unwrap();

        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].name, "Istanbul");
        assert!(cache
            .get_destinations(&LanguageCode::parse("de").unwrap())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_hotel_search_miss_before_set() {
        let cache = service();
        let result = cache
            .get_hotel_search("1", d(2025, 6, 1), d(2025, 6, 5), 2, 0)
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_round_trip_every_category() {
        let cache = service();
        let en = LanguageCode::default();
        let (check_in, check_out) = (d(2025, 6, 1), d(2025, 6, 5));

        let resorts = vec![ResortDto {
            id: "10".to_string(),
            name: "Sultanahmet".to_string(),
            destination_id: "1".to_string(),
            ..ResortDto::default()
        }];
        cache.set_resorts(&resorts, &en, Some("1")).await;
        assert_eq!(cache.get_resorts(&en, Some("1")).await, Some(resorts));
        assert_eq!(cache.get_resorts(&en, None).await, None);

        let offers = vec![offer("100", 120.0), offer("101", 95.5)];
        cache
            .set_hotel_search("1", check_in, check_out, 2, 0, &offers)
            .await;
        assert_eq!(
            cache.get_hotel_search("1", check_in, check_out, 2, 0).await,
            Some(offers)
        );
        assert_eq!(cache.get_hotel_search("1", check_in, check_out, 2, 1).await, None);

        let details = HotelDetails {
            hotel_id: "100".to_string(),
            name: "Pera Palace".to_string(),
            description: Some("Historic".to_string()),
            rooms: offer("100", 120.0).rooms,
            images: vec![],
        };
        cache
            .set_hotel_details("100", check_in, check_out, 2, &details)
            .await;
        assert_eq!(
            cache.get_hotel_details("100", check_in, check_out, 2).await,
            Some(details)
        );

        cache.set_popular_hotels(Some("1"), Some(5), &[]).await;
        assert_eq!(cache.get_popular_hotels(Some("1"), Some(5)).await, Some(vec![]));
        assert_eq!(cache.get_popular_hotels(Some("1"), None).await, None);
    }

    #[tokio::test]
    async fn test_invalidation_on_local_store_keeps_entries() {
        let cache = service();
        let (check_in, check_out) = (d(2025, 6, 1), d(2025, 6, 5));
        cache
            .set_hotel_search("1", check_in, check_out, 2, 0, &[offer("100", 80.0)])
            .await;

        assert_eq!(cache.invalidate_destination_searches("1").await, 0);
        assert_eq!(cache.invalidate_all_searches().await, 0);

        assert!(cache
            .get_hotel_search("1", check_in, check_out, 2, 0)
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_search_entries_expire() {
        let store = Arc::new(LocalCacheStore::new(cache_ttl::DEFAULT));
        let cache = ProviderCacheService::new(store.clone());
        let key = cache_keys::hotel_search("1", d(2025, 6, 1), d(2025, 6, 5), 2, 0);
        store
            .set_raw(&key, "[]", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(cache
            .get_hotel_search("1", d(2025, 6, 1), d(2025, 6, 5), 2, 0)
            .await
            .is_none());
    }
}
