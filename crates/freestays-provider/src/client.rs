//! SunHotels HTTP client.
//!
//! Talks JSON to the provider gateway with basic auth. Every transport
//! failure, timeout, 5xx and 429 is reported as `ProviderUnavailable`;
//! nothing here retries.

use crate::dto::{
    BookRequest, BookingConfirmation, DestinationDto, HotelDetails, HotelDetailsRequest, HotelDto,
    HotelOffer, HotelSearchRequest, PreBookRequest, PreBookResult, ReferenceItemDto, ResortDto,
    RoomDto,
};
use crate::traits::{BookingProvider, StaticDataProvider};
use crate::PROVIDER_NAME;
use async_trait::async_trait;
use freestays_config::SunHotelsConfig;
use freestays_core::{FreestaysError, FreestaysResult, LanguageCode};
use freestays_domain::ReferenceKind;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// SunHotels gateway client.
#[derive(Clone)]
pub struct SunHotelsClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    currency: String,
}

/// Search responses arrive wrapped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default, alias = "Hotels")]
    hotels: Vec<HotelOffer>,
}

impl SunHotelsClient {
    /// Creates a client from configuration.
    pub fn new(config: &SunHotelsConfig) -> FreestaysResult<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            FreestaysError::Configuration(format!("Invalid SunHotels base URL: {}", e))
        })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| FreestaysError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Creates a client around an existing `reqwest::Client`.
    pub fn with_client(client: Client, config: &SunHotelsConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            currency: config.currency.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.username.is_empty() {
            request
        } else {
            request.basic_auth(&self.username, Some(&self.password))
        }
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<T>> {
        debug!(path, language = %language, "Fetching static data from provider");

        let request = self
            .client
            .get(self.url(path))
            .query(&[("language", language.as_str())]);

        let response = self.authorize(request).send().await.map_err(map_transport_error)?;
        handle_response(response).await
    }

    async fn post_json<B: serde::Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> FreestaysResult<T> {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.authorize(request).send().await.map_err(map_transport_error)?;
        handle_response(response).await
    }
}

/// Path of a lookup list on the gateway.
fn reference_path(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Meal => "/static/meals",
        ReferenceKind::RoomType => "/static/roomtypes",
        ReferenceKind::Feature => "/static/features",
        ReferenceKind::Theme => "/static/themes",
        ReferenceKind::Language => "/static/languages",
        ReferenceKind::TransferType => "/static/transfertypes",
        ReferenceKind::NoteType => "/static/notetypes",
    }
}

#[async_trait]
impl StaticDataProvider for SunHotelsClient {
    async fn destinations(&self, language: &LanguageCode) -> FreestaysResult<Vec<DestinationDto>> {
        self.get_list("/static/destinations", language).await
    }

    async fn resorts(&self, language: &LanguageCode) -> FreestaysResult<Vec<ResortDto>> {
        self.get_list("/static/resorts", language).await
    }

    async fn reference_items(
        &self,
        kind: ReferenceKind,
        language: &LanguageCode,
    ) -> FreestaysResult<Vec<ReferenceItemDto>> {
        self.get_list(reference_path(kind), language).await
    }

    async fn hotels(&self, language: &LanguageCode) -> FreestaysResult<Vec<HotelDto>> {
        self.get_list("/static/hotels", language).await
    }

    async fn rooms(&self, language: &LanguageCode) -> FreestaysResult<Vec<RoomDto>> {
        self.get_list("/static/rooms", language).await
    }
}

#[async_trait]
impl BookingProvider for SunHotelsClient {
    async fn search_hotels(&self, request: &HotelSearchRequest) -> FreestaysResult<Vec<HotelOffer>> {
        debug!(
            destination = %request.destination_id,
            check_in = %request.check_in,
            check_out = %request.check_out,
            "Provider search"
        );

        let mut body = request.clone();
        if body.currency.is_none() {
            body.currency = Some(self.currency.clone());
        }
        let response: SearchResponse = self.post_json("/search", &body).await?;
        Ok(response.hotels)
    }

    async fn hotel_details(
        &self,
        request: &HotelDetailsRequest,
    ) -> FreestaysResult<Option<HotelDetails>> {
        debug!(hotel = %request.hotel_id, "Provider hotel details");

        match self.post_json("/hotel-details", request).await {
            Ok(details) => Ok(Some(details)),
            Err(FreestaysError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn pre_book(&self, request: &PreBookRequest) -> FreestaysResult<PreBookResult> {
        debug!(hotel = %request.hotel_id, room = %request.room_id, "Provider pre-book");
        self.post_json("/prebook", request).await
    }

    async fn book(&self, request: &BookRequest) -> FreestaysResult<BookingConfirmation> {
        debug!(hotel = %request.hotel_id, "Provider book");
        self.post_json("/book", request).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> FreestaysResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(map_http_error(status, &body));
    }

    response.json().await.map_err(|e| FreestaysError::ExternalService {
        service: PROVIDER_NAME.to_string(),
        message: format!("Unreadable response: {}", e),
    })
}

fn map_transport_error(err: reqwest::Error) -> FreestaysError {
    let reason = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    warn!(error = %err, "SunHotels {}", reason);
    FreestaysError::provider_unavailable(PROVIDER_NAME, format!("{}: {}", reason, err))
}

fn map_http_error(status: StatusCode, body: &str) -> FreestaysError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        warn!(status = %status, "SunHotels unavailable");
        return FreestaysError::provider_unavailable(PROVIDER_NAME, format!("HTTP {}", status));
    }
    match status {
        StatusCode::NOT_FOUND => FreestaysError::NotFound {
            resource_type: "ProviderResource",
            id: body.to_string(),
        },
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            FreestaysError::Validation(body.to_string())
        }
        StatusCode::CONFLICT => FreestaysError::Conflict(body.to_string()),
        _ => FreestaysError::ExternalService {
            service: PROVIDER_NAME.to_string(),
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
