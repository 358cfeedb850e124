//! Hotel row.

use crate::GeoPoint;
use chrono::{DateTime, Utc};
use freestays_core::LanguageCode;
use serde::{Deserialize, Serialize};

/// One hotel in one language.
///
/// The id lists are stored as JSON text columns; here they are plain
/// vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub external_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub star_category: Option<f32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub resort_id: Option<i64>,
    pub destination_id: Option<i64>,
    #[serde(default)]
    pub feature_ids: Vec<i64>,
    #[serde(default)]
    pub theme_ids: Vec<i64>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub language: LanguageCode,
    pub last_synced_at: DateTime<Utc>,
}

impl Hotel {
    /// The hotel's position, if both coordinates are known.
    #[must_use]
    pub fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Returns true if every id in `required` is among the hotel's features.
    #[must_use]
    pub fn has_all_features(&self, required: &[i64]) -> bool {
        required.iter().all(|id| self.feature_ids.contains(id))
    }

    /// Returns true if every id in `required` is among the hotel's themes.
    #[must_use]
    pub fn has_all_themes(&self, required: &[i64]) -> bool {
        required.iter().all(|id| self.theme_ids.contains(id))
    }

    /// Case-insensitive match on name, city or address.
    #[must_use]
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let contains = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|value| value.to_lowercase().contains(&term))
        };
        self.name.to_lowercase().contains(&term) || contains(&self.city) || contains(&self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel() -> Hotel {
        Hotel {
            external_id: 10,
            name: "Pera Palace".to_string(),
            address: Some("Mesrutiyet Cd. 52".to_string()),
            city: Some("Istanbul".to_string()),
            country: Some("Turkey".to_string()),
            country_code: Some("TR".to_string()),
            star_category: Some(5.0),
            latitude: Some(41.0319),
            longitude: Some(28.9746),
            resort_id: Some(7),
            destination_id: Some(1),
            feature_ids: vec![1, 2, 3],
            theme_ids: vec![20],
            image_urls: vec![],
            language: LanguageCode::default(),
            last_synced_at: Utc::now(),
        }
    }

    #[test]
    fn test_feature_and_theme_containment() {
        let hotel = hotel();
        assert!(hotel.has_all_features(&[1, 3]));
        assert!(!hotel.has_all_features(&[1, 4]));
        assert!(hotel.has_all_features(&[]));
        assert!(hotel.has_all_themes(&[20]));
        assert!(!hotel.has_all_themes(&[20, 21]));
    }

    #[test]
    fn test_matches_term() {
        let hotel = hotel();
        assert!(hotel.matches_term("pera"));
        assert!(hotel.matches_term("ISTANBUL"));
        assert!(hotel.matches_term("  "));
        assert!(!hotel.matches_term("ankara"));
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut hotel = hotel();
        assert!(hotel.location().is_some());
        hotel.longitude = None;
        assert!(hotel.location().is_none());
    }

    #[test]
    fn test_missing_lists_deserialize_as_empty() {
        let mut value = serde_json::to_value(hotel()).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("featureIds");
        object.remove("themeIds");
        let decoded: Hotel = serde_json::from_value(value).unwrap();
        assert!(decoded.feature_ids.is_empty());
        assert!(decoded.theme_ids.is_empty());
    }
}
