//! Provider DTOs to durable rows.
//!
//! A DTO whose own id (or required parent id) is not numeric cannot be keyed
//! and is dropped. Unparsable optional references and list entries are
//! dropped individually.

use chrono::{DateTime, Utc};
use freestays_core::LanguageCode;
use freestays_domain::{Destination, Hotel, ReferenceItem, ReferenceKind, Resort, Room};
use freestays_provider::{DestinationDto, HotelDto, ReferenceItemDto, ResortDto, RoomDto};

/// Rows that mapped, and how many DTOs did not.
#[derive(Debug)]
pub(crate) struct Mapped<T> {
    pub rows: Vec<T>,
    pub dropped: usize,
}

pub(crate) fn map_all<D, T>(dtos: Vec<D>, f: impl FnMut(D) -> Option<T>) -> Mapped<T> {
    let total = dtos.len();
    let rows: Vec<T> = dtos.into_iter().filter_map(f).collect();
    Mapped {
        dropped: total - rows.len(),
        rows,
    }
}

fn parse_id(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

fn parse_ids(values: &[String]) -> Vec<i64> {
    values.iter().filter_map(|v| parse_id(v)).collect()
}

fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn urls(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

pub(crate) fn destination(
    dto: DestinationDto,
    language: &LanguageCode,
    synced_at: DateTime<Utc>,
) -> Option<Destination> {
    Some(Destination {
        external_id: parse_id(&dto.id)?,
        code: text(dto.code).unwrap_or_default(),
        name: dto.name.trim().to_string(),
        country: text(dto.country).unwrap_or_default(),
        country_code: text(dto.country_code).unwrap_or_default().to_uppercase(),
        time_zone: text(dto.time_zone),
        language: language.clone(),
        last_synced_at: synced_at,
    })
}

pub(crate) fn resort(dto: ResortDto, language: &LanguageCode, synced_at: DateTime<Utc>) -> Option<Resort> {
    Some(Resort {
        external_id: parse_id(&dto.id)?,
        name: dto.name.trim().to_string(),
        destination_id: parse_id(&dto.destination_id)?,
        country_name: text(dto.country_name).unwrap_or_default(),
        country_code: text(dto.country_code).unwrap_or_default().to_uppercase(),
        language: language.clone(),
        last_synced_at: synced_at,
    })
}

pub(crate) fn reference_item(
    kind: ReferenceKind,
    dto: ReferenceItemDto,
    language: &LanguageCode,
    synced_at: DateTime<Utc>,
) -> Option<ReferenceItem> {
    let external_id = dto.id.trim().to_string();
    if external_id.is_empty() {
        return None;
    }
    Some(ReferenceItem {
        kind,
        external_id,
        name: dto.name.trim().to_string(),
        language: language.clone(),
        last_synced_at: synced_at,
    })
}

pub(crate) fn hotel(dto: HotelDto, language: &LanguageCode, synced_at: DateTime<Utc>) -> Option<Hotel> {
    Some(Hotel {
        external_id: parse_id(&dto.id)?,
        name: dto.name.trim().to_string(),
        address: text(dto.address),
        city: text(dto.city),
        country: text(dto.country),
        country_code: text(dto.country_code).map(|c| c.to_uppercase()),
        star_category: dto.stars.filter(|s| s.is_finite() && *s >= 0.0),
        latitude: dto.latitude.filter(|l| (-90.0..=90.0).contains(l)),
        longitude: dto.longitude.filter(|l| (-180.0..=180.0).contains(l)),
        resort_id: dto.resort_id.as_deref().and_then(parse_id),
        destination_id: dto.destination_id.as_deref().and_then(parse_id),
        feature_ids: parse_ids(&dto.feature_ids),
        theme_ids: parse_ids(&dto.theme_ids),
        image_urls: urls(dto.images),
        language: language.clone(),
        last_synced_at: synced_at,
    })
}

pub(crate) fn room(dto: RoomDto, language: &LanguageCode, synced_at: DateTime<Utc>) -> Option<Room> {
    let min_occupancy = dto.min_occupancy.unwrap_or(1);
    Some(Room {
        external_id: parse_id(&dto.id)?,
        hotel_id: parse_id(&dto.hotel_id)?,
        room_type_id: dto.room_type_id.as_deref().and_then(parse_id),
        name: dto.name.trim().to_string(),
        min_occupancy,
        max_occupancy: dto.max_occupancy.unwrap_or(min_occupancy).max(min_occupancy),
        feature_ids: parse_ids(&dto.feature_ids),
        image_urls: urls(dto.images),
        language: language.clone(),
        last_synced_at: synced_at,
    })
}
