//! Repository trait definitions.

use async_trait::async_trait;
use freestays_core::{FreestaysResult, LanguageCode, Page, PageRequest};
use freestays_domain::{
    Destination, Hotel, HotelFilter, ReferenceItem, ReferenceKind, Resort, Room, StaticDataKind,
};
use std::collections::HashMap;
use std::hash::Hash;

/// Durable SunHotels static-data cache.
///
/// Upserts replace a row wholesale when (external id, language) already
/// exists and return the number of distinct rows written: a key repeated in
/// one batch counts once and its last occurrence wins. Lookups that find nothing
/// return `None` or an empty list. Results are ordered by name, then id.
#[async_trait]
pub trait StaticDataRepository: Send + Sync {
    // ============ Writes ============

    /// Upserts destinations in one transaction.
    async fn upsert_destinations(&self, rows: &[Destination]) -> FreestaysResult<u64>;

    /// Upserts resorts in one transaction.
    async fn upsert_resorts(&self, rows: &[Resort]) -> FreestaysResult<u64>;

    /// Upserts lookup rows of one kind in one transaction.
    ///
    /// Every row must be of `kind`.
    async fn upsert_reference_items(
        &self,
        kind: ReferenceKind,
        rows: &[ReferenceItem],
    ) -> FreestaysResult<u64>;

    /// Upserts hotels in one transaction.
    async fn upsert_hotels(&self, rows: &[Hotel]) -> FreestaysResult<u64>;

    /// Upserts rooms in one transaction.
    async fn upsert_rooms(&self, rows: &[Room]) -> FreestaysResult<u64>;

    // ============ Destinations ============

    async fn find_destinations(&self, language: &LanguageCode) -> FreestaysResult<Vec<Destination>>;

    async fn find_destination(
        &self,
        id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<Destination>>;

    /// Case-insensitive substring match on name, code or country.
    async fn search_destinations(
        &self,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Destination>>;

    // ============ Resorts ============

    async fn find_resorts(&self, language: &LanguageCode) -> FreestaysResult<Vec<Resort>>;

    async fn find_resort(&self, id: i64, language: &LanguageCode)
        -> FreestaysResult<Option<Resort>>;

    async fn find_resorts_by_destination(
        &self,
        destination_id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Resort>>;

    /// Case-insensitive substring match on name or country.
    async fn search_resorts(&self, term: &str, language: &LanguageCode)
        -> FreestaysResult<Vec<Resort>>;

    // ============ Reference lists ============

    async fn find_reference_items(
        &self,
        kind: ReferenceKind,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>>;

    async fn find_reference_item(
        &self,
        kind: ReferenceKind,
        id: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<ReferenceItem>>;

    /// Case-insensitive substring match on the display name.
    async fn search_reference_items(
        &self,
        kind: ReferenceKind,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>>;

    // ============ Hotels and rooms ============

    async fn find_hotel(&self, id: i64, language: &LanguageCode) -> FreestaysResult<Option<Hotel>>;

    /// Hotels among `ids`; unknown ids are skipped.
    async fn find_hotels_by_ids(
        &self,
        ids: &[i64],
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Hotel>>;

    /// One page of hotels matching the scalar filter.
    async fn find_hotels(&self, filter: &HotelFilter, page: PageRequest)
        -> FreestaysResult<Page<Hotel>>;

    /// Every hotel matching the scalar filter, for in-memory refinement.
    async fn find_all_hotels(&self, filter: &HotelFilter) -> FreestaysResult<Vec<Hotel>>;

    async fn find_rooms_by_hotel(
        &self,
        hotel_id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Room>>;

    // ============ Bookkeeping ============

    /// Number of rows of one category in one language.
    async fn count(&self, kind: StaticDataKind, language: &LanguageCode) -> FreestaysResult<u64>;
}

/// Keeps the last row per key, in order of first appearance.
pub(crate) fn last_per_key<T, K, F>(rows: &[T], key: F) -> Vec<&T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::with_capacity(rows.len());
    let mut kept: Vec<&T> = Vec::with_capacity(rows.len());
    for row in rows {
        match slots.get(&key(row)) {
            Some(&slot) => kept[slot] = row,
            None => {
                slots.insert(key(row), kept.len());
                kept.push(row);
            }
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_per_key_keeps_last_value_in_first_position() {
        let rows = [(1, "Pera"), (2, "Galata"), (1, "Pera Palace"), (3, "Moda")];
        let kept = last_per_key(&rows, |row| row.0);
        assert_eq!(kept, vec![&(1, "Pera Palace"), &(2, "Galata"), &(3, "Moda")]);
    }

    #[test]
    fn test_last_per_key_empty() {
        let rows: [(i64, &str); 0] = [];
        assert!(last_per_key(&rows, |row| row.0).is_empty());
    }
}
