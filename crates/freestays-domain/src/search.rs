//! Hotel filters and the advanced search envelope.

use crate::Hotel;
use chrono::NaiveDate;
use freestays_core::{LanguageCode, Page, PageRequest};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Shown on results of a search without dates.
pub const PRICE_MESSAGE_SELECT_DATES: &str = "Select dates to see prices";

/// Shown on hotels the provider did not price for the requested dates.
pub const PRICE_MESSAGE_NO_AVAILABILITY: &str = "No availability for the selected dates";

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres (haversine).
    #[must_use]
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// Scalar hotel filters the repository can apply directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelFilter {
    pub language: LanguageCode,
    pub destination_id: Option<i64>,
    pub resort_id: Option<i64>,
    pub country_code: Option<String>,
    pub min_stars: Option<f32>,
    pub max_stars: Option<f32>,
    /// Case-insensitive substring of name, city or address.
    pub text: Option<String>,
}

impl HotelFilter {
    /// Creates a filter matching every hotel in `language`.
    #[must_use]
    pub fn new(language: LanguageCode) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_destination(mut self, destination_id: i64) -> Self {
        self.destination_id = Some(destination_id);
        self
    }

    #[must_use]
    pub fn with_resort(mut self, resort_id: i64) -> Self {
        self.resort_id = Some(resort_id);
        self
    }

    #[must_use]
    pub fn with_min_stars(mut self, stars: f32) -> Self {
        self.min_stars = Some(stars);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Applies the filter to a row. Used by in-memory implementations.
    #[must_use]
    pub fn matches(&self, hotel: &Hotel) -> bool {
        if hotel.language != self.language {
            return false;
        }
        if self.destination_id.is_some() && hotel.destination_id != self.destination_id {
            return false;
        }
        if self.resort_id.is_some() && hotel.resort_id != self.resort_id {
            return false;
        }
        if let Some(code) = &self.country_code {
            let same = hotel
                .country_code
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(code));
            if !same {
                return false;
            }
        }
        let stars = hotel.star_category.unwrap_or(0.0);
        if self.min_stars.is_some_and(|min| stars < min) {
            return false;
        }
        if self.max_stars.is_some_and(|max| stars > max) {
            return false;
        }
        self.text
            .as_deref()
            .map_or(true, |text| hotel.matches_term(text))
    }
}

/// Result ordering for the advanced search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Alphabetical by name.
    #[default]
    Relevance,
    StarsDesc,
    StarsAsc,
    PriceAsc,
    PriceDesc,
    Distance,
}

/// Whether a search result carries live prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchType {
    /// Reference data only, no dates.
    Static,
    /// Dated search joined with provider prices.
    Dynamic,
}

/// Multi-criteria hotel search.
///
/// Scalar criteria are pushed down to the repository; id lists, meal types,
/// price range and the geo radius are applied after loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "validate_criteria"))]
pub struct HotelSearchCriteria {
    pub language: LanguageCode,
    pub destination_id: Option<i64>,
    pub resort_id: Option<i64>,
    pub country_code: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Stars must be between 0 and 5"))]
    pub min_stars: Option<f32>,
    #[validate(range(min = 0.0, max = 5.0, message = "Stars must be between 0 and 5"))]
    pub max_stars: Option<f32>,
    /// Every listed theme must be present.
    pub theme_ids: Vec<i64>,
    /// Every listed feature must be present.
    pub feature_ids: Vec<i64>,
    /// At least one listed meal must be offered (dynamic search only).
    pub meal_ids: Vec<i64>,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub max_price: Option<f64>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0, message = "Distance must not be negative"))]
    pub max_distance_km: Option<f64>,
    pub text: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub adults: u32,
    pub children: u32,
    /// One age per child, forwarded when pricing.
    pub children_ages: Vec<u32>,
    pub sort_by: SortBy,
    pub page: usize,
    pub page_size: usize,
}

fn validate_criteria(criteria: &HotelSearchCriteria) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (criteria.min_stars, criteria.max_stars) {
        if min > max {
            return Err(ValidationError::new("star_range")
                .with_message("minStars must not exceed maxStars".into()));
        }
    }
    if let (Some(min), Some(max)) = (criteria.min_price, criteria.max_price) {
        if min > max {
            return Err(ValidationError::new("price_range")
                .with_message("minPrice must not exceed maxPrice".into()));
        }
    }
    if criteria.latitude.is_some() != criteria.longitude.is_some() {
        return Err(ValidationError::new("reference_point")
            .with_message("latitude and longitude must be given together".into()));
    }
    match (criteria.check_in, criteria.check_out) {
        (Some(check_in), Some(check_out)) if check_out <= check_in => {
            Err(ValidationError::new("stay_dates")
                .with_message("checkOut must be after checkIn".into()))
        }
        (Some(_), None) | (None, Some(_)) => Err(ValidationError::new("stay_dates")
            .with_message("checkIn and checkOut must be given together".into())),
        _ => Ok(()),
    }
}

impl HotelSearchCriteria {
    /// Scalar part of the criteria, for the repository.
    #[must_use]
    pub fn to_filter(&self) -> HotelFilter {
        HotelFilter {
            language: self.language.clone(),
            destination_id: self.destination_id,
            resort_id: self.resort_id,
            country_code: self.country_code.clone(),
            min_stars: self.min_stars,
            max_stars: self.max_stars,
            text: self.text.clone().filter(|t| !t.trim().is_empty()),
        }
    }

    /// The reference point of the geo filter, if any.
    #[must_use]
    pub fn reference_point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint::new(latitude, longitude)),
            _ => None,
        }
    }

    /// Stay dates, when both are set.
    #[must_use]
    pub fn stay(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.check_in.zip(self.check_out)
    }

    /// A dated search inside a destination is priced by the provider.
    #[must_use]
    pub fn wants_pricing(&self) -> bool {
        self.stay().is_some() && self.destination_id.is_some()
    }

    /// Adults for pricing; at least one.
    #[must_use]
    pub fn effective_adults(&self) -> u32 {
        self.adults.max(1)
    }

    /// Page request, defaulting and clamping page and size.
    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        let size = if self.page_size == 0 {
            PageRequest::DEFAULT_SIZE
        } else {
            self.page_size
        };
        PageRequest::new(self.page, size)
    }
}

/// The cheapest live offer of one hotel for a dated search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelPrice {
    pub hotel_id: i64,
    pub min_price: f64,
    pub currency: String,
    /// Meals offered with any of the hotel's rooms.
    pub meal_ids: Vec<i64>,
}

/// One hotel of an advanced search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchHit {
    pub hotel: Hotel,
    pub distance_km: Option<f64>,
    pub min_price: Option<f64>,
    pub currency: Option<String>,
    pub has_pricing: bool,
    pub price_message: Option<String>,
}

impl HotelSearchHit {
    /// A hit without pricing, explained by `message`.
    #[must_use]
    pub fn unpriced(hotel: Hotel, distance_km: Option<f64>, message: &str) -> Self {
        Self {
            hotel,
            distance_km,
            min_price: None,
            currency: None,
            has_pricing: false,
            price_message: Some(message.to_string()),
        }
    }

    /// A hit carrying the hotel's cheapest offer.
    #[must_use]
    pub fn priced(hotel: Hotel, distance_km: Option<f64>, price: &HotelPrice) -> Self {
        Self {
            hotel,
            distance_km,
            min_price: Some(price.min_price),
            currency: Some(price.currency.clone()),
            has_pricing: true,
            price_message: None,
        }
    }
}

/// Advanced search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelSearchEnvelope {
    pub search_type: SearchType,
    pub total_count: u64,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: u64,
    pub results: Vec<HotelSearchHit>,
}

impl HotelSearchEnvelope {
    /// Wraps a page of hits.
    #[must_use]
    pub fn from_page(search_type: SearchType, page: Page<HotelSearchHit>) -> Self {
        Self {
            search_type,
            total_count: page.total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            results: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_distance_km() {
        let istanbul = GeoPoint::new(41.0082, 28.9784);
        let ankara = GeoPoint::new(39.9334, 32.8597);
        let distance = istanbul.distance_km(&ankara);
        assert!((distance - 350.0).abs() < 5.0, "got {distance}");
        assert!(istanbul.distance_km(&istanbul).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_criteria_is_valid_and_static() {
        let criteria = HotelSearchCriteria::default();
        assert!(criteria.validate().is_ok());
        assert!(!criteria.wants_pricing());
        assert_eq!(criteria.page_request(), PageRequest::new(1, PageRequest::DEFAULT_SIZE));
        assert_eq!(criteria.language.as_str(), "en");
    }

    #[test]
    fn test_criteria_rejects_inverted_ranges() {
        let criteria = HotelSearchCriteria {
            min_stars: Some(4.0),
            max_stars: Some(3.0),
            ..HotelSearchCriteria::default()
        };
        assert!(criteria.validate().is_err());

        let criteria = HotelSearchCriteria {
            check_in: NaiveDate::from_ymd_opt(2025, 6, 5),
            check_out: NaiveDate::from_ymd_opt(2025, 6, 1),
            ..HotelSearchCriteria::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_criteria_rejects_half_reference_point() {
        let criteria = HotelSearchCriteria {
            latitude: Some(41.0),
            ..HotelSearchCriteria::default()
        };
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_wants_pricing_needs_dates_and_destination() {
        let mut criteria = HotelSearchCriteria {
            check_in: NaiveDate::from_ymd_opt(2025, 6, 1),
            check_out: NaiveDate::from_ymd_opt(2025, 6, 5),
            ..HotelSearchCriteria::default()
        };
        assert!(!criteria.wants_pricing());
        criteria.destination_id = Some(1);
        assert!(criteria.wants_pricing());
    }

    #[test]
    fn test_criteria_deserializes_from_partial_json() {
        let criteria: HotelSearchCriteria = serde_json::from_str(
            r#"{"destinationId": 1, "themeIds": [3, 4], "sortBy": "starsDesc", "language": "DE"}"#,
        )
        .unwrap();
        assert_eq!(criteria.destination_id, Some(1));
        assert_eq!(criteria.theme_ids, vec![3, 4]);
        assert_eq!(criteria.sort_by, SortBy::StarsDesc);
        assert_eq!(criteria.language.as_str(), "de");
    }

    #[test]
    fn test_filter_from_criteria_drops_blank_text() {
        let criteria = HotelSearchCriteria {
            text: Some("  ".to_string()),
            destination_id: Some(9),
            ..HotelSearchCriteria::default()
        };
        let filter = criteria.to_filter();
        assert!(filter.text.is_none());
        assert_eq!(filter.destination_id, Some(9));
    }
}
