//! Cache key builders.
//!
//! A key encodes the parameters listed on its builder; queries that differ
//! only in anything else share an entry. Prefix builders end with `:` so that
//! `search:1:` never matches `search:12:...`.

use chrono::NaiveDate;
use freestays_core::LanguageCode;

const ALL: &str = "all";

fn date(value: NaiveDate) -> String {
    value.format("%Y%m%d").to_string()
}

fn or_all<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| ALL.to_string(), |v| v.to_string())
}

/// `destinations:{language}`
#[must_use]
pub fn destinations(language: &LanguageCode) -> String {
    format!("destinations:{}", language)
}

/// `resorts:{language}:{destination|all}`
#[must_use]
pub fn resorts(language: &LanguageCode, destination_id: Option<&str>) -> String {
    format!("resorts:{}:{}", language, or_all(destination_id))
}

/// `search:{destination}:{checkIn}:{checkOut}:{adults}:{children}`
///
/// Currency, language and children's ages are not part of the key. Searches
/// differing only in those share an entry; `BookingService` therefore only
/// caches searches in its default currency and language.
#[must_use]
pub fn hotel_search(
    destination_id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
    adults: u32,
    children: u32,
) -> String {
    format!(
        "search:{}:{}:{}:{}:{}",
        destination_id,
        date(check_in),
        date(check_out),
        adults,
        children
    )
}

/// `hotel:{hotel}:{checkIn}:{checkOut}:{adults}`
#[must_use]
pub fn hotel_details(hotel_id: &str, check_in: NaiveDate, check_out: NaiveDate, adults: u32) -> String {
    format!("hotel:{}:{}:{}:{}", hotel_id, date(check_in), date(check_out), adults)
}

/// `popular:{destination|all}:{stars|all}`
#[must_use]
pub fn popular_hotels(destination_id: Option<&str>, stars: Option<u8>) -> String {
    format!("popular:{}:{}", or_all(destination_id), or_all(stars))
}

/// `static:hotel:{language}:{hotel}`, a single hotel row read through from the durable tables.
#[must_use]
pub fn static_hotel(hotel_id: i64, language: &LanguageCode) -> String {
    format!("static:hotel:{}:{}", language, hotel_id)
}

/// Every search of one destination.
#[must_use]
pub fn destination_searches_prefix(destination_id: &str) -> String {
    format!("search:{}:", destination_id)
}

/// Every cached details entry of one hotel.
#[must_use]
pub fn hotel_details_prefix(hotel_id: &str) -> String {
    format!("hotel:{}:", hotel_id)
}

/// Every cached search.
#[must_use]
pub fn all_searches_prefix() -> String {
    "search:".to_string()
}
