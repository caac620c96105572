//! Bus information API HTTP client.
//!
//! Provides async methods for the station arrival and vehicle position
//! endpoints. Responses are requested as JSON and unwrapped from the feed's
//! envelope; result code `4` ("no result") is reported as an empty batch.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::StationId;

use super::error::FeedError;
use super::source::{ArrivalSource, VehiclePositionSource};
use super::types::{BusPosition, FeedResponse, RawArrivalRecord};

/// Default base URL for the bus information API.
const DEFAULT_BASE_URL: &str = "http://ws.bus.go.kr/api/rest";

/// Result code for a successful call.
const CODE_OK: &str = "0";

/// Result code when the query matched nothing.
const CODE_NO_RESULT: &str = "4";

/// Result code for an unregistered service key.
const CODE_UNREGISTERED_KEY: &str = "7";

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Service key issued by the open data portal
    pub service_key: String,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    /// Create a new config with the given service key.
    pub fn new(service_key: impl Into<String>) -> Self {
        Self {
            service_key: service_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP client for the bus information API.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl FeedClient {
    /// Create a new feed client with the given configuration.
    pub fn new(config: FeedClientConfig) -> Result<Self, FeedError> {
        if config.service_key.is_empty() {
            return Err(FeedError::InvalidRequest(
                "service key cannot be empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_key: config.service_key,
        })
    }

    /// Get arrival snapshots for every route at a station.
    pub async fn get_station_arrivals(
        &self,
        station: &StationId,
    ) -> Result<Vec<RawArrivalRecord>, FeedError> {
        let url = format!("{}/stationinfo/getStationByUid", self.base_url);
        self.get_items(&url, &[("arsId", station.as_str())]).await
    }

    /// Get the latest position report for a vehicle.
    pub async fn get_vehicle_position(
        &self,
        vehicle_id: &str,
    ) -> Result<Option<BusPosition>, FeedError> {
        let url = format!("{}/buspos/getBusPosByVehId", self.base_url);
        let items: Vec<BusPosition> = self.get_items(&url, &[("vehId", vehicle_id)]).await?;
        Ok(items.into_iter().next())
    }

    async fn get_items<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, FeedError> {
        let response = self
            .http
            .get(url)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("resultType", "json"),
            ])
            .query(params)
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FeedError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_items(&body)
    }
}

/// Unwrap a feed envelope into its item list.
fn parse_items<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, FeedError> {
    let response: FeedResponse<T> = serde_json::from_str(body).map_err(|e| FeedError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(200).collect()),
    })?;

    match response.msg_header.header_cd.as_str() {
        CODE_OK => Ok(response.msg_body.item_list.unwrap_or_default()),
        CODE_NO_RESULT => {
            debug!(message = %response.msg_header.header_msg, "feed returned no result");
            Ok(Vec::new())
        }
        CODE_UNREGISTERED_KEY => Err(FeedError::Unauthorized),
        code => Err(FeedError::Api {
            code: code.to_string(),
            message: response.msg_header.header_msg,
        }),
    }
}

impl ArrivalSource for FeedClient {
    async fn fetch_arrivals(&self, station: &StationId) -> Result<Vec<RawArrivalRecord>, FeedError> {
        self.get_station_arrivals(station).await
    }
}

impl VehiclePositionSource for FeedClient {
    async fn fetch_position(&self, vehicle_id: &str) -> Result<Option<BusPosition>, FeedError> {
        self.get_vehicle_position(vehicle_id).await
    }
}
