//! MySQL static-data cache repository.

use super::rows::{
    encode_list, DestinationRow, HotelRow, ReferenceRow, ResortRow, RoomRow, DESTINATION_COLUMNS,
    HOTEL_COLUMNS, REFERENCE_COLUMNS, RESORT_COLUMNS, ROOM_COLUMNS,
};
use crate::traits::last_per_key;
use crate::{DatabasePool, StaticDataRepository};
use async_trait::async_trait;
use freestays_core::{FreestaysError, FreestaysResult, LanguageCode, Page, PageRequest};
use freestays_domain::{
    Destination, Hotel, HotelFilter, ReferenceItem, ReferenceKind, Resort, Room, StaticDataKind,
};
use sqlx::{MySql, QueryBuilder};
use std::sync::Arc;
use tracing::debug;

/// Rows per multi-row INSERT statement.
const UPSERT_CHUNK: usize = 500;

const DESTINATIONS_TABLE: &str = "sunhotels_destinations_cache";
const RESORTS_TABLE: &str = "sunhotels_resorts_cache";
const HOTELS_TABLE: &str = "sunhotels_hotels_cache";
const ROOMS_TABLE: &str = "sunhotels_rooms_cache";

fn table_for(kind: StaticDataKind) -> &'static str {
    match kind {
        StaticDataKind::Destinations => DESTINATIONS_TABLE,
        StaticDataKind::Resorts => RESORTS_TABLE,
        StaticDataKind::Reference(kind) => kind.table_name(),
        StaticDataKind::Hotels => HOTELS_TABLE,
        StaticDataKind::Rooms => ROOMS_TABLE,
    }
}

/// Lowercased LIKE pattern matching `term` anywhere.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_hotel_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &HotelFilter) {
    builder
        .push(" WHERE language = ")
        .push_bind(filter.language.to_string());

    if let Some(destination_id) = filter.destination_id {
        builder.push(" AND destination_id = ").push_bind(destination_id);
    }
    if let Some(resort_id) = filter.resort_id {
        builder.push(" AND resort_id = ").push_bind(resort_id);
    }
    if let Some(country_code) = &filter.country_code {
        builder
            .push(" AND UPPER(country_code) = ")
            .push_bind(country_code.to_uppercase());
    }
    if let Some(min_stars) = filter.min_stars {
        builder.push(" AND COALESCE(star_category, 0) >= ").push_bind(min_stars);
    }
    if let Some(max_stars) = filter.max_stars {
        builder.push(" AND COALESCE(star_category, 0) <= ").push_bind(max_stars);
    }
    if let Some(text) = filter.text.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = like_pattern(text);
        builder
            .push(" AND (LOWER(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(city, '')) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(COALESCE(address, '')) LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// MySQL-backed static-data cache.
#[derive(Clone)]
pub struct MySqlStaticDataRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlStaticDataRepository {
    /// Creates a new repository over `pool`.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    async fn fetch_hotels(&self, builder: &mut QueryBuilder<'_, MySql>) -> FreestaysResult<Vec<Hotel>> {
        let rows = builder
            .build_query_as::<HotelRow>()
            .fetch_all(self.pool.inner())
            .await?;
        rows.into_iter().map(Hotel::try_from).collect()
    }

    async fn fetch_reference_items(
        &self,
        kind: ReferenceKind,
        sql: &str,
        binds: &[&str],
    ) -> FreestaysResult<Vec<ReferenceItem>> {
        let mut query = sqlx::query_as::<_, ReferenceRow>(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        let rows = query.fetch_all(self.pool.inner()).await?;
        rows.into_iter().map(|row| row.into_item(kind)).collect()
    }
}

#[async_trait]
impl StaticDataRepository for MySqlStaticDataRepository {
    async fn upsert_destinations(&self, rows: &[Destination]) -> FreestaysResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        debug!(rows = rows.len(), "Upserting destinations");

        let mut tx = self.pool.inner().begin().await?;
        for chunk in rows.chunks(UPSERT_CHUNK) {
            let mut builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                DESTINATIONS_TABLE, DESTINATION_COLUMNS
            ));
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.external_id)
                    .push_bind(row.language.to_string())
                    .push_bind(row.code.clone())
                    .push_bind(row.name.clone())
                    .push_bind(row.country.clone())
                    .push_bind(row.country_code.clone())
                    .push_bind(row.time_zone.clone())
                    .push_bind(row.last_synced_at);
            });
            builder.push(
                " ON DUPLICATE KEY UPDATE code = VALUES(code), name = VALUES(name), \
                 country = VALUES(country), country_code = VALUES(country_code), \
                 time_zone = VALUES(time_zone), last_synced_at = VALUES(last_synced_at)",
            );
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    async fn upsert_resorts(&self, rows: &[Resort]) -> FreestaysResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        debug!(rows = rows.len(), "Upserting resorts");

        let mut tx = self.pool.inner().begin().await?;
        for chunk in rows.chunks(UPSERT_CHUNK) {
            let mut builder: QueryBuilder<MySql> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", RESORTS_TABLE, RESORT_COLUMNS));
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.external_id)
                    .push_bind(row.language.to_string())
                    .push_bind(row.name.clone())
                    .push_bind(row.destination_id)
                    .push_bind(row.country_name.clone())
                    .push_bind(row.country_code.clone())
                    .push_bind(row.last_synced_at);
            });
            builder.push(
                " ON DUPLICATE KEY UPDATE name = VALUES(name), \
                 destination_id = VALUES(destination_id), country_name = VALUES(country_name), \
                 country_code = VALUES(country_code), last_synced_at = VALUES(last_synced_at)",
            );
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    async fn upsert_reference_items(
        &self,
        kind: ReferenceKind,
        rows: &[ReferenceItem],
    ) -> FreestaysResult<u64> {
        if let Some(stray) = rows.iter().find(|row| row.kind != kind) {
            return Err(FreestaysError::validation(format!(
                "{} row {} written to {}",
                stray.kind, stray.external_id, kind
            )));
        }
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = last_per_key(rows, |row| (row.external_id.clone(), row.language.clone()));
        debug!(rows = rows.len(), category = %kind, "Upserting reference items");

        let mut tx = self.pool.inner().begin().await?;
        for chunk in rows.chunks(UPSERT_CHUNK) {
            let mut builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                kind.table_name(),
                REFERENCE_COLUMNS
            ));
            builder.push_values(chunk, |mut b, row| {
                b.push_bind(row.external_id.clone())
                    .push_bind(row.language.to_string())
                    .push_bind(row.name.clone())
                    .push_bind(row.last_synced_at);
            });
            builder.push(
                " ON DUPLICATE KEY UPDATE name = VALUES(name), \
                 last_synced_at = VALUES(last_synced_at)",
            );
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    async fn upsert_hotels(&self, rows: &[Hotel]) -> FreestaysResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        debug!(rows = rows.len(), "Upserting hotels");

        let mut tx = self.pool.inner().begin().await?;
        for chunk in rows.chunks(UPSERT_CHUNK) {
            let lists = chunk
                .iter()
                .map(|h| {
                    Ok((
                        encode_list(&h.feature_ids)?,
                        encode_list(&h.theme_ids)?,
                        encode_list(&h.image_urls)?,
                    ))
                })
                .collect::<FreestaysResult<Vec<_>>>()?;

            let mut builder: QueryBuilder<MySql> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", HOTELS_TABLE, HOTEL_COLUMNS));
            builder.push_values(chunk.iter().zip(lists), |mut b, (row, (features, themes, images))| {
                b.push_bind(row.external_id)
                    .push_bind(row.language.to_string())
                    .push_bind(row.name.clone())
                    .push_bind(row.address.clone())
                    .push_bind(row.city.clone())
                    .push_bind(row.country.clone())
                    .push_bind(row.country_code.clone())
                    .push_bind(row.star_category)
                    .push_bind(row.latitude)
                    .push_bind(row.longitude)
                    .push_bind(row.resort_id)
                    .push_bind(row.destination_id)
                    .push_bind(features)
                    .push_bind(themes)
                    .push_bind(images)
                    .push_bind(row.last_synced_at);
            });
            builder.push(
                " ON DUPLICATE KEY UPDATE name = VALUES(name), address = VALUES(address), \
                 city = VALUES(city), country = VALUES(country), \
                 country_code = VALUES(country_code), star_category = VALUES(star_category), \
                 latitude = VALUES(latitude), longitude = VALUES(longitude), \
                 resort_id = VALUES(resort_id), destination_id = VALUES(destination_id), \
                 feature_ids = VALUES(feature_ids), theme_ids = VALUES(theme_ids), \
                 image_urls = VALUES(image_urls), last_synced_at = VALUES(last_synced_at)",
            );
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    async fn upsert_rooms(&self, rows: &[Room]) -> FreestaysResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let rows = last_per_key(rows, |row| (row.external_id, row.language.clone()));
        debug!(rows = rows.len(), "Upserting rooms");

        let mut tx = self.pool.inner().begin().await?;
        for chunk in rows.chunks(UPSERT_CHUNK) {
            let lists = chunk
                .iter()
                .map(|r| Ok((encode_list(&r.feature_ids)?, encode_list(&r.image_urls)?)))
                .collect::<FreestaysResult<Vec<_>>>()?;

            let mut builder: QueryBuilder<MySql> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", ROOMS_TABLE, ROOM_COLUMNS));
            builder.push_values(chunk.iter().zip(lists), |mut b, (row, (features, images))| {
                b.push_bind(row.external_id)
                    .push_bind(row.language.to_string())
                    .push_bind(row.hotel_id)
                    .push_bind(row.room_type_id)
                    .push_bind(row.name.clone())
                    .push_bind(row.min_occupancy)
                    .push_bind(row.max_occupancy)
                    .push_bind(features)
                    .push_bind(images)
                    .push_bind(row.last_synced_at);
            });
            builder.push(
                " ON DUPLICATE KEY UPDATE hotel_id = VALUES(hotel_id), \
                 room_type_id = VALUES(room_type_id), name = VALUES(name), \
                 min_occupancy = VALUES(min_occupancy), max_occupancy = VALUES(max_occupancy), \
                 feature_ids = VALUES(feature_ids), image_urls = VALUES(image_urls), \
                 last_synced_at = VALUES(last_synced_at)",
            );
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    async fn find_destinations(&self, language: &LanguageCode) -> FreestaysResult<Vec<Destination>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE language = ? ORDER BY name, external_id",
            DESTINATION_COLUMNS, DESTINATIONS_TABLE
        );
        let rows = sqlx::query_as::<_, DestinationRow>(&sql)
            .bind(language.as_str())
            .fetch_all(self.pool.inner())
            .await?;
        rows.into_iter().map(Destination::try_from).collect()
    }

    async fn find_destination(
        &self,
        id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<Destination>> {
        debug!("Finding destination {} ({})", id, language);
        let sql = format!(
            "SELECT {} FROM {} WHERE external_id = ? AND language = ?",
            DESTINATION_COLUMNS, DESTINATIONS_TABLE
        );
        let row = sqlx::query_as::<_, DestinationRow>(&sql)
            .bind(id)
            .bind(language.as_str())
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Destination::try_from).transpose()
    }

    async fn search_destinations(
        &self,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Destination>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE language = ? \
             AND (LOWER(name) LIKE ? OR LOWER(code) LIKE ? OR LOWER(country) LIKE ?) \
             ORDER BY name, external_id",
            DESTINATION_COLUMNS, DESTINATIONS_TABLE
        );
        let pattern = like_pattern(term);
        let rows = sqlx::query_as::<_, DestinationRow>(&sql)
            .bind(language.as_str())
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(self.pool.inner())
            .await?;
        rows.into_iter().map(Destination::try_from).collect()
    }

    async fn find_resorts(&self, language: &LanguageCode) -> FreestaysResult<Vec<Resort>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE language = ? ORDER BY name, external_id",
            RESORT_COLUMNS, RESORTS_TABLE
        );
        let rows = sqlx::query_as::<_, ResortRow>(&sql)
            .bind(language.as_str())
            .fetch_all(self.pool.inner())
            .await?;
        rows.into_iter().map(Resort::try_from).collect()
    }

    async fn find_resort(&self, id: i64, language: &LanguageCode) -> FreestaysResult<Option<Resort>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE external_id = ? AND language = ?",
            RESORT_COLUMNS, RESORTS_TABLE
        );
        let row = sqlx::query_as::<_, ResortRow>(&sql)
            .bind(id)
            .bind(language.as_str())
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Resort::try_from).transpose()
    }

    async fn find_resorts_by_destination(
        &self,
        destination_id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Resort>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE destination_id = ? AND language = ? \
             ORDER BY name, external_id",
            RESORT_COLUMNS, RESORTS_TABLE
        );
        let rows = sqlx::query_as::<_, ResortRow>(&sql)
            .bind(destination_id)
            .bind(language.as_str())
            .fetch_all(self.pool.inner())
            .await?;
        rows.into_iter().map(Resort::try_from).collect()
    }

    async fn search_resorts(&self, term: &str, language: &LanguageCode) -> FreestaysResult<Vec<Resort>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE language = ? \
             AND (LOWER(name) LIKE ? OR LOWER(country_name) LIKE ?) \
             ORDER BY name, external_id",
            RESORT_COLUMNS, RESORTS_TABLE
        );
        let pattern = like_pattern(term);
        let rows = sqlx::query_as::<_, ResortRow>(&sql)
            .bind(language.as_str())
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(self.pool.inner())
            .await?;
        rows.into_iter().map(Resort::try_from).collect()
    }

    async fn find_reference_items(
        &self,
        kind: ReferenceKind,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE language = ? ORDER BY name, external_id",
            REFERENCE_COLUMNS,
            kind.table_name()
        );
        self.fetch_reference_items(kind, &sql, &[language.as_str()]).await
    }

    async fn find_reference_item(
        &self,
        kind: ReferenceKind,
        id: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Option<ReferenceItem>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE external_id = ? AND language = ?",
            REFERENCE_COLUMNS,
            kind.table_name()
        );
        let mut items = self
            .fetch_reference_items(kind, &sql, &[id, language.as_str()])
            .await?;
        Ok(items.pop())
    }

    async fn search_reference_items(
        &self,
        kind: ReferenceKind,
        term: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItem>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE language = ? AND LOWER(name) LIKE ? \
             ORDER BY name, external_id",
            REFERENCE_COLUMNS,
            kind.table_name()
        );
        let pattern = like_pattern(term);
        self.fetch_reference_items(kind, &sql, &[language.as_str(), pattern.as_str()])
            .await
    }

    async fn find_hotel(&self, id: i64, language: &LanguageCode) -> FreestaysResult<Option<Hotel>> {
        debug!("Finding hotel {} ({})", id, language);
        let sql = format!(
            "SELECT {} FROM {} WHERE external_id = ? AND language = ?",
            HOTEL_COLUMNS, HOTELS_TABLE
        );
        let row = sqlx::query_as::<_, HotelRow>(&sql)
            .bind(id)
            .bind(language.as_str())
            .fetch_optional(self.pool.inner())
            .await?;
        row.map(Hotel::try_from).transpose()
    }

    async fn find_hotels_by_ids(
        &self,
        ids: &[i64],
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Hotel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "SELECT {} FROM {} WHERE language = ",
            HOTEL_COLUMNS, HOTELS_TABLE
        ));
        builder.push_bind(language.to_string());
        builder.push(" AND external_id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY name, external_id");

        self.fetch_hotels(&mut builder).await
    }

    async fn find_hotels(&self, filter: &HotelFilter, page: PageRequest) -> FreestaysResult<Page<Hotel>> {
        debug!(
            "Finding hotels, destination: {:?}, resort: {:?}, page: {}, size: {}",
            filter.destination_id, filter.resort_id, page.page, page.size
        );

        let mut count: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", HOTELS_TABLE));
        push_hotel_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(self.pool.inner())
            .await?;

        let mut select: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT {} FROM {}", HOTEL_COLUMNS, HOTELS_TABLE));
        push_hotel_filter(&mut select, filter);
        select
            .push(" ORDER BY name, external_id LIMIT ")
            .push_bind(page.limit() as u64)
            .push(" OFFSET ")
            .push_bind(page.offset() as u64);
        let hotels = self.fetch_hotels(&mut select).await?;

        Ok(Page::new(hotels, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn find_all_hotels(&self, filter: &HotelFilter) -> FreestaysResult<Vec<Hotel>> {
        let mut select: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT {} FROM {}", HOTEL_COLUMNS, HOTELS_TABLE));
        push_hotel_filter(&mut select, filter);
        select.push(" ORDER BY name, external_id");
        self.fetch_hotels(&mut select).await
    }

    async fn find_rooms_by_hotel(
        &self,
        hotel_id: i64,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<Room>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE hotel_id = ? AND language = ? ORDER BY name, external_id",
            ROOM_COLUMNS, ROOMS_TABLE
        );
        let rows = sqlx::query_as::<_, RoomRow>(&sql)
            .bind(hotel_id)
            .bind(language.as_str())
            .fetch_all(self.pool.inner())
            .await?;
        rows.into_iter().map(Room::try_from).collect()
    }

    async fn count(&self, kind: StaticDataKind, language: &LanguageCode) -> FreestaysResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE language = ?", table_for(kind));
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(language.as_str())
            .fetch_one(self.pool.inner())
            .await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
