//! Provider trait definitions.

use crate::dto::{
    BookRequest, BookingConfirmation, DestinationDto, HotelDetails, HotelDetailsRequest, HotelDto,
    HotelOffer, HotelSearchRequest, PreBookRequest, PreBookResult, ReferenceItemDto, ResortDto,
    RoomDto,
};
use async_trait::async_trait;
use freestays_core::{FreestaysResult, LanguageCode};
use freestays_domain::ReferenceKind;

/// Whole-list static data endpoints, one call per category and language.
#[async_trait]
pub trait StaticDataProvider: Send + Sync {
    /// Fetches every destination.
    async fn destinations(&self, language: &LanguageCode) -> FreestaysResult<Vec<DestinationDto>>;

    /// Fetches every resort.
    async fn resorts(&self, language: &LanguageCode) -> FreestaysResult<Vec<ResortDto>>;

    /// Fetches one flat lookup list.
    async fn reference_items(
        &self,
        kind: ReferenceKind,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItemDto>>;

    /// Fetches every hotel.
    async fn hotels(&self, language: &LanguageCode) -> FreestaysResult<Vec<HotelDto>>;

    /// Fetches every room of every hotel.
    async fn rooms(&self, language: &LanguageCode) -> FreestaysResult<Vec<RoomDto>>;
}

/// Live booking endpoints.
#[async_trait]
pub trait BookingProvider: Send + Sync {
    /// Priced availability for a destination and stay.
    async fn search_hotels(&self, request: &HotelSearchRequest) -> FreestaysResult<Vec<HotelOffer>>;

    /// Priced details of one hotel; `None` if the provider does not know it.
    async fn hotel_details(
        &self,
        request: &HotelDetailsRequest,
    ) -> FreestaysResult<Option<HotelDetails>>;

    /// Locks the price of one offer and returns the code the booking needs.
    async fn pre_book(&self, request: &PreBookRequest) -> FreestaysResult<PreBookResult>;

    /// Confirms a pre-booked offer.
    async fn book(&self, request: &BookRequest) -> FreestaysResult<BookingConfirmation>;
}
