//! In-memory static-data cache.
//!
//! Same contract as the MySQL repository, for tests and for running
//! without a database.

use crate::traits::last_per_key;
use crate::StaticDataRepository;
use async_trait::async_trait;
use freestays_core::{FreestaysError, FreestaysResult, LanguageCode, Page, PageRequest};
use freestays_domain::{
    Destination, Hotel, HotelFilter, ReferenceItem, ReferenceKind, Resort, Room, StaticDataKind,
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};

type Key = (i64, LanguageCode);

#[derive(Default)]
struct Tables {
    destinations: BTreeMap<Key, Destination>,
    resorts: BTreeMap<Key, Resort>,
    references: BTreeMap<(ReferenceKind, String, LanguageCode), ReferenceItem>,
    hotels: BTreeMap<Key, Hotel>,
    rooms: BTreeMap<Key, Room>,
}

/// In-memory static-data cache.
#[derive(Default)]
pub struct InMemoryStaticDataRepository {
    tables: RwLock<Tables>,
    failing: RwLock<HashSet<StaticDataKind>>,
}

fn by_name<T, F>(rows: impl Iterator<Item = T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (String, String),
{
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| key(row));
    rows
}

impl InMemoryStaticDataRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every upsert of `kind` fail with a database error.
    pub fn fail_upserts_for(&self, kind: StaticDataKind) {
        self.failing.write().insert(kind);
    }

    fn check_writable(&self, kind: StaticDataKind) -> FreestaysResult<()> {
        if self.failing.read().contains(&kind) {
            return Err(FreestaysError::Database(format!("{} table unavailable", kind)));
        }
        Ok(())
    }

    fn sorted_hotels<'a>(hotels: impl Iterator<Item = &'a Hotel>) -> Vec<Hotel> {
        by_name(hotels.cloned(), |h| (h.name.clone(), format!("{:020}", h.external_id)))
    }
}

#[async_trait]
impl StaticDataRepository for InMemoryStaticDataRepository {
    async fn upsert_destinations(&self, rows: &[Destination]) -> FreestaysResult<u64> {
        self.check_writable(StaticDataKind::Destinations)?;
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        let mut tables = self.tables.write();
        for row in &rows {
            tables
                .destinations
                .insert((row.external_id, row.language.clone()), (*row).clone());
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_resorts(&self, rows: &[Resort]) -> FreestaysResult<u64> {
        self.check_writable(StaticDataKind::Resorts)?;
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        let mut tables = self.tables.write();
        for row in &rows {
            tables
                .resorts
                .insert((row.external_id, row.language.clone()), (*row).clone());
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_reference_items(
        &self,
        kind: ReferenceKind,
        rows: &[ReferenceItem],
    ) -> FreestaysResult<u64> {
        self.check_writable(StaticDataKind::Reference(kind))?;
        if let Some(stray) = rows.iter().find(|row| row.kind != kind) {
            return Err(FreestaysError::validation(format!(
                "{} row {} written to {}",
                stray.kind, stray.external_id, kind
            )));
        }
        let rows = last_per_key(rows, |row| (row.external_id.clone(), row.language.clone()));
        let mut tables = self.tables.write();
        for row in &rows {
            tables.references.insert(
                (kind, row.external_id.clone(), row.language.clone()),
                (*row).clone(),
            );
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_hotels(&self, rows: &[Hotel]) -> FreestaysResult<u64> {
        self.check_writable(StaticDataKind::Hotels)?;
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        let mut tables = self.tables.write();
        for row in &rows {
            tables
                .hotels
                .insert((row.external_id, row.language.clone()), (*row).clone());
        }
        Ok(rows.len() as u64)
    }

    async fn upsert_rooms(&self, rows: &[Room]) -> FreestaysResult<u64> {
        self.check_writable(StaticDataKind::Rooms)?;
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        let mut tables = self.tables.write();
        for row in &rows {
            tables
                .rooms
                .insert((row.external_id, row.language.clone()), (*row).clone());
        }
        Ok(rows.len() as u64)
    }

    async fn find_destinations(&self, language: &LanguageCode) -> FreestaysResult<Vec<Destination>> {
        let tables = self.tables.read();
        Ok(by_name(
            tables
                .destinations
                .values()
                .filter(|d| &d.language == language)
                .cloned(),
            |d| (d.name.clone(), format!("{:020}", d.external_id)),
        ))
    }

    async fn find_destination(
        &self,
        id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<Destination>> {
        Ok(self
            .tables
            .read()
            .destinations
            .get(&(id, language.clone()))
            .cloned())
    }

    async fn search_destinations(
        &self,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Destination>> {
        let all = self.find_destinations(language).await?;
        Ok(all.into_iter().filter(|d| d.matches_term(term)).collect())
    }

    async fn find_resorts(&self, language: &LanguageCode) -> FreestaysResult<Vec<Resort>> {
        let tables = self.tables.read();
        Ok(by_name(
            tables
                .resorts
                .values()
                .filter(|r| &r.language == language)
                .cloned(),
            |r| (r.name.clone(), format!("{:020}", r.external_id)),
        ))
    }

    async fn find_resort(&self, id: i64, language: &LanguageCode) -> FreestaysResult<Option<Resort>> {
        Ok(self.tables.read().resorts.get(&(id, language.clone())).cloned())
    }

    async fn find_resorts_by_destination(
        &self,
        destination_id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Resort>> {
        let all = self.find_resorts(language).await?;
        Ok(all
            .into_iter()
            .filter(|r| r.destination_id == destination_id)
            .collect())
    }

    async fn search_resorts(&self, term: &str, language: &LanguageCode) -> FreestaysResult<Vec<Resort>> {
        let all = self.find_resorts(language).await?;
        Ok(all.into_iter().filter(|r| r.matches_term(term)).collect())
    }

    async fn find_reference_items(
        &self,
        kind: ReferenceKind,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>> {
        let tables = self.tables.read();
        Ok(by_name(
            tables
                .references
                .values()
                .filter(|i| i.kind == kind && &i.language == language)
                .cloned(),
            |i| (i.name.clone(), i.external_id.clone()),
        ))
    }

    async fn find_reference_item(
        &self,
        kind: ReferenceKind,
        id: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<ReferenceItem>> {
        Ok(self
            .tables
            .read()
            .references
            .get(&(kind, id.to_string(), language.clone()))
            .cloned())
    }

    async fn search_reference_items(
        &self,
        kind: ReferenceKind,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>> {
        let all = self.find_reference_items(kind, language).await?;
        Ok(all.into_iter().filter(|i| i.matches_term(term)).collect())
    }

    async fn find_hotel(&self, id: i64, language: &LanguageCode) -> FreestaysResult<Option<Hotel>> {
        Ok(self.tables.read().hotels.get(&(id, language.clone())).cloned())
    }

    async fn find_hotels_by_ids(
        &self,
        ids: &[i64],
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Hotel>> {
        let tables = self.tables.read();
        Ok(Self::sorted_hotels(
            tables
                .hotels
                .values()
                .filter(|h| &h.language == language && ids.contains(&h.external_id)),
        ))
    }

    async fn find_hotels(&self, filter: &HotelFilter, page: PageRequest) -> FreestaysResult<Page<Hotel>> {
        let all = self.find_all_hotels(filter).await?;
        Ok(Page::from_all(all, page))
    }

    async fn find_all_hotels(&self, filter: &HotelFilter) -> FreestaysResult<Vec<Hotel>> {
        let tables = self.tables.read();
        Ok(Self::sorted_hotels(
            tables.hotels.values().filter(|h| filter.matches(h)),
        ))
    }

    async fn find_rooms_by_hotel(
        &self,
        hotel_id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Room>> {
        let tables = self.tables.read();
        Ok(by_name(
            tables
                .rooms
                .values()
                .filter(|r| r.hotel_id == hotel_id && &r.language == language)
                .cloned(),
            |r| (r.name.clone(), format!("{:020}", r.external_id)),
        ))
    }

    async fn count(&self, kind: StaticDataKind, language: &LanguageCode) -> FreestaysResult<u64> {
        let tables = self.tables.read();
        let count = match kind {
            StaticDataKind::Destinations => tables
                .destinations
                .values()
                .filter(|r| &r.language == language)
                .count(),
            StaticDataKind::Resorts => tables
                .resorts
                .values()
                .filter(|r| &r.language == language)
                .count(),
            StaticDataKind::Reference(kind) => tables
                .references
                .values()
                .filter(|r| r.kind == kind && &r.language == language)
                .count(),
            StaticDataKind::Hotels => tables
                .hotels
                .values()
                .filter(|r| &r.language == language)
                .count(),
            StaticDataKind::Rooms => tables
                .rooms
                .values()
                .filter(|r| &r.language == language)
                .count(),
        };
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hotel(id: i64, name: &str, destination: i64, stars: f32) -> Hotel {
        Hotel {
            external_id: id,
            name: name.to_string(),
            address: None,
            city: Some("Istanbul".to_string()),
            country: Some("Turkey".to_string()),
            country_code: Some("TR".to_string()),
            star_category: Some(stars),
            latitude: None,
            longitude: None,
            resort_id: None,
            destination_id: Some(destination),
            feature_ids: vec![],
            theme_ids: vec![],
            image_urls: vec![],
            language: LanguageCode::default(),
            last_synced_at: Utc::now(),
        }
    }

    fn meal(id: &str, name: &str) -> ReferenceItem {
        ReferenceItem {
            kind: ReferenceKind::Meal,
            external_id: id.to_string(),
            name: name.to_string(),
            language: LanguageCode::default(),
            last_synced_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_repeated_key_in_one_batch_counts_once() {
        let repo = InMemoryStaticDataRepository::new();
        let written = repo
            .upsert_hotels(&[
                hotel(1, "Pera", 1, 5.0),
                hotel(2, "Galata", 1, 4.0),
                hotel(1, "Pera Palace", 1, 5.0),
            ])
            .await
            .unwrap();

        assert_eq!(written, 2);
        let found = repo.find_hotel(1, &LanguageCode::default()).await.unwrap().unwrap();
        assert_eq!(found.name, "Pera Palace");
    }

    #[tokio::test]
    async fn test_upsert_twice_keeps_one_row_per_key() {
        let repo = InMemoryStaticDataRepository::new();
        let rows = vec![hotel(1, "Pera", 1, 5.0), hotel(2, "Galata", 1, 4.0)];

        repo.upsert_hotels(&rows).await.unwrap();
        let first = repo.find_all_hotels(&HotelFilter::default()).await.unwrap();
        repo.upsert_hotels(&rows).await.unwrap();
        let second = repo.find_all_hotels(&HotelFilter::default()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.count(StaticDataKind::Hotels, &LanguageCode::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_wholesale() {
        let repo = InMemoryStaticDataRepository::new();
        repo.upsert_hotels(&[hotel(1, "Pera", 1, 5.0)]).await.unwrap();
        repo.upsert_hotels(&[hotel(1, "Pera Palace", 2, 4.5)]).await.unwrap();

        let found = repo.find_hotel(1, &LanguageCode::default()).await.unwrap().unwrap();
        assert_eq!(found.name, "Pera Palace");
        assert_eq!(found.destination_id, Some(2));
    }

    #[tokio::test]
    async fn test_language_variants_are_independent_rows() {
        let repo = InMemoryStaticDataRepository::new();
        let german = LanguageCode::parse("de").unwrap();
        let mut de = hotel(1, "Pera Palast", 1, 5.0);
        de.language = german.clone();

        repo.upsert_hotels(&[hotel(1, "Pera Palace", 1, 5.0), de]).await.unwrap();

        assert_eq!(
            repo.find_hotel(1, &german).await.unwrap().unwrap().name,
            "Pera Palast"
        );
        assert_eq!(
            repo.find_hotel(1, &LanguageCode::default()).await.unwrap().unwrap().name,
            "Pera Palace"
        );
    }

    #[tokio::test]
    async fn test_find_hotels_filters_and_pages_by_name() {
        let repo = InMemoryStaticDataRepository::new();
        repo.upsert_hotels(&[
            hotel(1, "Cihangir Suites", 1, 3.0),
            hotel(2, "Ayasofya Inn", 1, 4.0),
            hotel(3, "Bosphorus View", 1, 5.0),
            hotel(4, "Antalya Beach", 2, 5.0),
        ])
        .await
        .unwrap();

        let filter = HotelFilter::new(LanguageCode::default())
            .with_destination(1)
            .with_min_stars(4.0);
        let page = repo.find_hotels(&filter, PageRequest::new(1, 1)).await.unwrap();

        assert_eq!(page.total_count, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].name, "Ayasofya Inn");
    }

    #[tokio::test]
    async fn test_find_hotels_by_resort() {
        let repo = InMemoryStaticDataRepository::new();
        let mut sultanahmet = hotel(1, "Ayasofya Inn", 1, 4.0);
        sultanahmet.resort_id = Some(10);
        repo.upsert_hotels(&[sultanahmet, hotel(2, "Galata", 1, 4.0)]).await.unwrap();

        let filter = HotelFilter::new(LanguageCode::default()).with_resort(10);
        let hotels = repo.find_all_hotels(&filter).await.unwrap();

        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0].external_id, 1);
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let repo = InMemoryStaticDataRepository::new();
        assert!(repo.find_destination(99, &LanguageCode::default()).await.unwrap().is_none());
        assert!(repo
            .find_reference_item(ReferenceKind::Theme, "1", &LanguageCode::default())
            .await
            .unwrap()
            .is_none());
        assert!(repo
            .find_hotels_by_ids(&[], &LanguageCode::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_reference_kind_mismatch_is_rejected() {
        let repo = InMemoryStaticDataRepository::new();
        let err = repo
            .upsert_reference_items(ReferenceKind::Theme, &[meal("1", "Breakfast")])
            .await
            .unwrap_err();
        assert!(matches!(err, FreestaysError::Validation(_)));
    }

    #[tokio::test]
    async fn test_search_reference_items() {
        let repo = InMemoryStaticDataRepository::new();
        repo.upsert_reference_items(
            ReferenceKind::Meal,
            &[meal("1", "Breakfast"), meal("2", "Half board"), meal("3", "Full board")],
        )
        .await
        .unwrap();

        let boards = repo
            .search_reference_items(ReferenceKind::Meal, "BOARD", &LanguageCode::default())
            .await
            .unwrap();
        let names: Vec<_> = boards.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Full board", "Half board"]);
    }

    #[tokio::test]
    async fn test_failing_table() {
        let repo = InMemoryStaticDataRepository::new();
        repo.fail_upserts_for(StaticDataKind::Hotels);
        assert!(repo.upsert_hotels(&[hotel(1, "Pera", 1, 5.0)]).await.is_err());
        assert!(repo.upsert_destinations(&[]).await.is_ok());
    }
}
