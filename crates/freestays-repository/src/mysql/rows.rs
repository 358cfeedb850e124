//! Database row representations and their conversion to domain rows.

use chrono::{DateTime, Utc};
use freestays_core::{FreestaysError, FreestaysResult, LanguageCode};
use freestays_domain::{Destination, Hotel, ReferenceItem, ReferenceKind, Resort, Room};
use sqlx::FromRow;

pub(crate) const DESTINATION_COLUMNS: &str =
    "external_id, language, code, name, country, country_code, time_zone, last_synced_at";

pub(crate) const RESORT_COLUMNS: &str =
    "external_id, language, name, destination_id, country_name, country_code, last_synced_at";

pub(crate) const REFERENCE_COLUMNS: &str = "external_id, language, name, last_synced_at";

pub(crate) const HOTEL_COLUMNS: &str = "external_id, language, name, address, city, country, \
     country_code, star_category, latitude, longitude, resort_id, destination_id, feature_ids, \
     theme_ids, image_urls, last_synced_at";

pub(crate) const ROOM_COLUMNS: &str = "external_id, language, hotel_id, room_type_id, name, \
     min_occupancy, max_occupancy, feature_ids, image_urls, last_synced_at";

fn parse_language(raw: &str) -> FreestaysResult<LanguageCode> {
    LanguageCode::parse(raw)
        .map_err(|e| FreestaysError::Internal(format!("Invalid language in database: {}", e)))
}

/// Encodes a list column.
pub(crate) fn encode_list<T: serde::Serialize>(values: &[T]) -> FreestaysResult<String> {
    Ok(serde_json::to_string(values)?)
}

/// Decodes a list column. Blank text is an empty list.
pub(crate) fn decode_list<T: serde::de::DeserializeOwned>(
    raw: &str,
    column: &str,
) -> FreestaysResult<Vec<T>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
        .map_err(|e| FreestaysError::Internal(format!("Invalid {} list in database: {}", column, e)))
}

#[derive(Debug, FromRow)]
pub(crate) struct DestinationRow {
    external_id: i64,
    language: String,
    code: String,
    name: String,
    country: String,
    country_code: String,
    time_zone: Option<String>,
    last_synced_at: DateTime<Utc>,
}

impl TryFrom<DestinationRow> for Destination {
    type Error = FreestaysError;

    fn try_from(row: DestinationRow) -> Result<Self, Self::Error> {
        Ok(Destination {
            external_id: row.external_id,
            code: row.code,
            name: row.name,
            country: row.country,
            country_code: row.country_code,
            time_zone: row.time_zone,
            language: parse_language(&row.language)?,
            last_synced_at: row.last_synced_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ResortRow {
    external_id: i64,
    language: String,
    name: String,
    destination_id: i64,
    country_name: String,
    country_code: String,
    last_synced_at: DateTime<Utc>,
}

impl TryFrom<ResortRow> for Resort {
    type Error = FreestaysError;

    fn try_from(row: ResortRow) -> Result<Self, Self::Error> {
        Ok(Resort {
            external_id: row.external_id,
            name: row.name,
            destination_id: row.destination_id,
            country_name: row.country_name,
            country_code: row.country_code,
            language: parse_language(&row.language)?,
            last_synced_at: row.last_synced_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReferenceRow {
    external_id: String,
    language: String,
    name: String,
    last_synced_at: DateTime<Utc>,
}

impl ReferenceRow {
    pub(crate) fn into_item(self, kind: ReferenceKind) -> FreestaysResult<ReferenceItem> {
        Ok(ReferenceItem {
            kind,
            external_id: self.external_id,
            name: self.name,
            language: parse_language(&self.language)?,
            last_synced_at: self.last_synced_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct HotelRow {
    external_id: i64,
    language: String,
    name: String,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
    star_category: Option<f32>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    resort_id: Option<i64>,
    destination_id: Option<i64>,
    feature_ids: String,
    theme_ids: String,
    image_urls: String,
    last_synced_at: DateTime<Utc>,
}

impl TryFrom<HotelRow> for Hotel {
    type Error = FreestaysError;

    fn try_from(row: HotelRow) -> Result<Self, Self::Error> {
        Ok(Hotel {
            external_id: row.external_id,
            name: row.name,
            address: row.address,
            city: row.city,
            country: row.country,
            country_code: row.country_code,
            star_category: row.star_category,
            latitude: row.latitude,
            longitude: row.longitude,
            resort_id: row.resort_id,
            destination_id: row.destination_id,
            feature_ids: decode_list(&row.feature_ids, "feature_ids")?,
            theme_ids: decode_list(&row.theme_ids, "theme_ids")?,
            image_urls: decode_list(&row.image_urls, "image_urls")?,
            language: parse_language(&row.language)?,
            last_synced_at: row.last_synced_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RoomRow {
    external_id: i64,
    language: String,
    hotel_id: i64,
    room_type_id: Option<i64>,
    name: String,
    min_occupancy: u32,
    max_occupancy: u32,
    feature_ids: String,
    image_urls: String,
    last_synced_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = FreestaysError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Room {
            external_id: row.external_id,
            hotel_id: row.hotel_id,
            room_type_id: row.room_type_id,
            name: row.name,
            min_occupancy: row.min_occupancy,
            max_occupancy: row.max_occupancy,
            feature_ids: decode_list(&row.feature_ids, "feature_ids")?,
            image_urls: decode_list(&row.image_urls, "image_urls")?,
            language: parse_language(&row.language)?,
            last_synced_at: row.last_synced_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_round_trip_through_text_column() {
        let encoded = encode_list(&[3_i64, 1, 2]).unwrap();
        assert_eq!(encoded, "[3,1,2]");
        assert_eq!(decode_list::<i64>(&encoded, "feature_ids").unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn test_blank_list_column_is_empty() {
        assert!(decode_list::<i64>("", "theme_ids").unwrap().is_empty());
        assert!(decode_list::<String>("  ", "image_urls").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_list_column_is_an_error() {
        let err = decode_list::<i64>("[1, \"two\"]", "feature_ids").unwrap_err();
        assert!(err.to_string().contains("feature_ids"));
    }

    #[test]
    fn test_hotel_row_conversion() {
        let row = HotelRow {
            external_id: 10,
            language: "en".to_string(),
            name: "Pera Palace".to_string(),
            address: None,
            city: Some("Istanbul".to_string()),
            country: None,
            country_code: Some("TR".to_string()),
            star_category: Some(5.0),
            latitude: None,
            longitude: None,
            resort_id: Some(7),
            destination_id: Some(1),
            feature_ids: "[1,2]".to_string(),
            theme_ids: "[]".to_string(),
            image_urls: "[\"https://img/1.jpg\"]".to_string(),
            last_synced_at: Utc::now(),
        };
        let hotel = Hotel::try_from(row).unwrap();
        assert_eq!(hotel.feature_ids, vec![1, 2]);
        assert!(hotel.theme_ids.is_empty());
        assert_eq!(hotel.image_urls, vec!["https://img/1.jpg".to_string()]);
    }
}
