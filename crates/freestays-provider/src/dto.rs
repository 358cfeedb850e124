//! Provider data transfer objects.
//!
//! Written camelCase. The provider has historically sent PascalCase
//! property names as well, so reads accept exactly those two casings plus
//! the prefixed aliases listed on each field (`destinationId`, `HotelId`).
//! Any other casing, such as `ID` or `NAME`, is an unknown field: it is
//! ignored and the field keeps its default, so a static data row read that
//! way has an empty id and is dropped during mapping.

use chrono::NaiveDate;
use freestays_core::LanguageCode;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// ============ Static data ============

/// A destination as listed by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DestinationDto {
    #[serde(alias = "Id", alias = "destinationId", alias = "DestinationId")]
    pub id: String,
    #[serde(alias = "Name", alias = "destinationName", alias = "DestinationName")]
    pub name: String,
    #[serde(alias = "Code", alias = "destinationCode", alias = "DestinationCode")]
    pub code: Option<String>,
    #[serde(alias = "Country", alias = "countryName", alias = "CountryName")]
    pub country: Option<String>,
    #[serde(alias = "CountryCode")]
    pub country_code: Option<String>,
    #[serde(alias = "TimeZone")]
    pub time_zone: Option<String>,
}

/// A resort as listed by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResortDto {
    #[serde(alias = "Id", alias = "resortId", alias = "ResortId")]
    pub id: String,
    #[serde(alias = "Name", alias = "resortName", alias = "ResortName")]
    pub name: String,
    #[serde(alias = "DestinationId")]
    pub destination_id: String,
    #[serde(alias = "CountryName")]
    pub country_name: Option<String>,
    #[serde(alias = "CountryCode")]
    pub country_code: Option<String>,
}

/// An entry of a flat lookup list (meal, theme, feature, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceItemDto {
    #[serde(alias = "Id")]
    pub id: String,
    #[serde(alias = "Name")]
    pub name: String,
}

/// A hotel as listed by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HotelDto {
    #[serde(alias = "Id", alias = "hotelId", alias = "HotelId")]
    pub id: String,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Address")]
    pub address: Option<String>,
    #[serde(alias = "City")]
    pub city: Option<String>,
    #[serde(alias = "Country")]
    pub country: Option<String>,
    #[serde(alias = "CountryCode")]
    pub country_code: Option<String>,
    #[serde(alias = "Stars", alias = "starCategory", alias = "StarCategory")]
    pub stars: Option<f32>,
    #[serde(alias = "Latitude")]
    pub latitude: Option<f64>,
    #[serde(alias = "Longitude")]
    pub longitude: Option<f64>,
    #[serde(alias = "ResortId")]
    pub resort_id: Option<String>,
    #[serde(alias = "DestinationId")]
    pub destination_id: Option<String>,
    #[serde(alias = "FeatureIds")]
    pub feature_ids: Vec<String>,
    #[serde(alias = "ThemeIds")]
    pub theme_ids: Vec<String>,
    #[serde(alias = "Images", alias = "imageUrls", alias = "ImageUrls")]
    pub images: Vec<String>,
}

/// A hotel room as listed by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomDto {
    #[serde(alias = "Id", alias = "roomId", alias = "RoomId")]
    pub id: String,
    #[serde(alias = "HotelId")]
    pub hotel_id: String,
    #[serde(alias = "RoomTypeId")]
    pub room_type_id: Option<String>,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "MinOccupancy")]
    pub min_occupancy: Option<u32>,
    #[serde(alias = "MaxOccupancy")]
    pub max_occupancy: Option<u32>,
    #[serde(alias = "FeatureIds")]
    pub feature_ids: Vec<String>,
    #[serde(alias = "Images", alias = "imageUrls", alias = "ImageUrls")]
    pub images: Vec<String>,
}

// ============ Booking ============

fn validate_children_ages(ages: &[u32], children: u32) -> Result<(), ValidationError> {
    if ages.len() != children as usize {
        return Err(ValidationError::new("children_ages")
            .with_message("one age is required per child".into()));
    }
    if ages.iter().any(|age| *age > 17) {
        return Err(ValidationError::new("children_ages")
            .with_message("children must be 17 or younger".into()));
    }
    Ok(())
}

fn validate_stay(check_in: NaiveDate, check_out: NaiveDate) -> Result<(), ValidationError> {
    if check_out <= check_in {
        return Err(ValidationError::new("stay_dates")
            .with_message("checkOut must be after checkIn".into()));
    }
    Ok(())
}

fn validate_search_request(request: &HotelSearchRequest) -> Result<(), ValidationError> {
    validate_stay(request.check_in, request.check_out)?;
    validate_children_ages(&request.children_ages, request.children)
}

fn validate_pre_book_request(request: &PreBookRequest) -> Result<(), ValidationError> {
    validate_stay(request.check_in, request.check_out)?;
    validate_children_ages(&request.children_ages, request.children)
}

fn validate_book_request(request: &BookRequest) -> Result<(), ValidationError> {
    validate_stay(request.check_in, request.check_out)
}

/// Priced availability search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_search_request"))]
pub struct HotelSearchRequest {
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub destination_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1, max = 9, message = "Between 1 and 9 adults are supported"))]
    pub adults: u32,
    #[serde(default)]
    #[validate(range(max = 9, message = "At most 9 children are supported"))]
    pub children: u32,
    #[serde(default)]
    pub children_ages: Vec<u32>,
    #[serde(default)]
    pub language: LanguageCode,
    pub currency: Option<String>,
}

/// One priced room of a search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOffer {
    #[serde(alias = "RoomId")]
    pub room_id: String,
    #[serde(default, alias = "RoomTypeId")]
    pub room_type_id: Option<String>,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "MealId")]
    pub meal_id: Option<String>,
    #[serde(alias = "Price")]
    pub price: f64,
    #[serde(alias = "Currency")]
    pub currency: String,
    #[serde(default, alias = "IsRefundable")]
    pub is_refundable: bool,
}

/// One hotel of a search result with its priced rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOffer {
    #[serde(alias = "HotelId")]
    pub hotel_id: String,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Rooms")]
    pub rooms: Vec<RoomOffer>,
}

impl HotelOffer {
    /// The cheapest room of this offer.
    #[must_use]
    pub fn cheapest_room(&self) -> Option<&RoomOffer> {
        self.rooms
            .iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }
}

/// Request for the priced details of one hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_details_request"))]
pub struct HotelDetailsRequest {
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub hotel_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1, max = 9, message = "Between 1 and 9 adults are supported"))]
    pub adults: u32,
    #[serde(default)]
    pub language: LanguageCode,
}

fn validate_details_request(request: &HotelDetailsRequest) -> Result<(), ValidationError> {
    validate_stay(request.check_in, request.check_out)
}

/// Priced details of one hotel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDetails {
    #[serde(alias = "HotelId")]
    pub hotel_id: String,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "Rooms")]
    pub rooms: Vec<RoomOffer>,
    #[serde(default, alias = "Images")]
    pub images: Vec<String>,
}

/// Request to lock the price of one room offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_pre_book_request"))]
pub struct PreBookRequest {
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub hotel_id: String,
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub room_id: String,
    pub meal_id: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1, max = 9, message = "Between 1 and 9 adults are supported"))]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub children_ages: Vec<u32>,
    /// Price shown to the user; the provider reports if it changed.
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub expected_price: f64,
    pub currency: String,
}

/// Locked offer returned by pre-book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreBookResult {
    #[serde(alias = "PreBookCode")]
    pub pre_book_code: String,
    #[serde(alias = "Price")]
    pub price: f64,
    #[serde(alias = "Currency")]
    pub currency: String,
    #[serde(default, alias = "PriceChanged")]
    pub price_changed: bool,
    #[serde(default, alias = "CancellationPolicies")]
    pub cancellation_policies: Vec<String>,
}

/// Lead guest of a booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GuestDto {
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub first_name: String,
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub last_name: String,
    pub age: Option<u32>,
}

/// Confirms a pre-booked offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_book_request"))]
pub struct BookRequest {
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub pre_book_code: String,
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub hotel_id: String,
    #[validate(custom(function = "freestays_core::rules::not_blank"))]
    pub room_id: String,
    pub meal_id: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(length(min = 1, message = "At least one guest is required"), nested)]
    pub guests: Vec<GuestDto>,
    #[validate(email(message = "A valid contact email is required"))]
    pub email: String,
    /// Our own reference, echoed back by the provider.
    pub your_ref: Option<String>,
}

/// Result of a confirmed booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    #[serde(alias = "BookingNumber")]
    pub booking_number: String,
    #[serde(alias = "Status")]
    pub status: String,
    #[serde(alias = "HotelId")]
    pub hotel_id: String,
    #[serde(alias = "TotalPrice")]
    pub total_price: f64,
    #[serde(alias = "Currency")]
    pub currency: String,
    #[serde(default, alias = "VoucherUrl")]
    pub voucher_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_request() -> HotelSearchRequest {
        HotelSearchRequest {
            destination_id: "1".to_string(),
            check_in: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
            adults: 2,
            children: 0,
            children_ages: vec![],
            language: LanguageCode::default(),
            currency: None,
        }
    }

    #[test]
    fn test_destination_accepts_pascal_case() {
        let dto: DestinationDto =
            serde_json::from_str(r#"{"Id": "1", "Name": "Istanbul", "CountryCode": "TR"}"#).unwrap();
        assert_eq!(dto.id, "1");
        assert_eq!(dto.name, "Istanbul");
        assert_eq!(dto.country_code.as_deref(), Some("TR"));
    }

    #[test]
    fn test_destination_ignores_other_casings() {
        let dto: DestinationDto =
            serde_json::from_str(r#"{"ID": "1", "NAME": "Istanbul", "destinationId": "2"}"#).unwrap();
        assert_eq!(dto.id, "2");
        assert!(dto.name.is_empty());

        let upper: DestinationDto = serde_json::from_str(r#"{"ID": "1"}"#).unwrap();
        assert!(upper.id.is_empty());
    }

    #[test]
    fn test_destination_writes_camel_case() {
        let dto = DestinationDto {
            id: "1".to_string(),
            name: "Istanbul".to_string(),
            country_code: Some("TR".to_string()),
            ..DestinationDto::default()
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["countryCode"], "TR");
        assert!(json.get("CountryCode").is_none());
    }

    #[test]
    fn test_hotel_lists_default_to_empty() {
        let dto: HotelDto = serde_json::from_str(r#"{"id": "10", "name": "Pera"}"#).unwrap();
        assert!(dto.feature_ids.is_empty());
        assert!(dto.images.is_empty());
        assert!(dto.stars.is_none());
    }

    #[test]
    fn test_search_request_validation() {
        assert!(search_request().validate().is_ok());

        let mut request = search_request();
        request.adults = 0;
        assert!(request.validate().is_err());

        let mut request = search_request();
        request.check_out = request.check_in;
        assert!(request.validate().is_err());

        let mut request = search_request();
        request.children = 2;
        request.children_ages = vec![5];
        assert!(request.validate().is_err());
        request.children_ages = vec![5, 9];
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_cheapest_room() {
        let room = |id: &str, price: f64| RoomOffer {
            room_id: id.to_string(),
            room_type_id: None,
            name: String::new(),
            meal_id: None,
            price,
            currency: "EUR".to_string(),
            is_refundable: true,
        };
        let offer = HotelOffer {
            hotel_id: "10".to_string(),
            name: "Pera".to_string(),
            rooms: vec![room("a", 120.0), room("b", 95.5), room("c", 140.0)],
        };
        assert_eq!(offer.cheapest_room().map(|r| r.room_id.as_str()), Some("b"));

        let empty = HotelOffer {
            rooms: vec![],
            ..offer
        };
        assert!(empty.cheapest_room().is_none());
    }
}
