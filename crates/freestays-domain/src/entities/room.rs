//! Room row.

use chrono::{DateTime, Utc};
use freestays_core::LanguageCode;
use serde::{Deserialize, Serialize};

/// A room type offered by a hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub external_id: i64,
    pub hotel_id: i64,
    pub room_type_id: Option<i64>,
    pub name: String,
    pub min_occupancy: u32,
    pub max_occupancy: u32,
    pub feature_ids: Vec<i64>,
    pub image_urls: Vec<String>,
    pub language: LanguageCode,
    pub last_synced_at: DateTime<Utc>,
}

impl Room {
    /// Returns true if `guests` fits the occupancy bounds.
    #[must_use]
    pub const fn fits(&self, guests: u32) -> bool {
        guests >= self.min_occupancy && guests <= self.max_occupancy
    }
}
