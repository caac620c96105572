//! Traits for the data sources a station session consumes.

use std::future::Future;

use crate::domain::StationId;

use super::error::FeedError;
use super::types::{BusPosition, RawArrivalRecord};

/// Provides raw arrival batches for a station.
///
/// This abstraction allows sessions to be tested with scripted data.
pub trait ArrivalSource: Send + Sync + 'static {
    /// Fetch the current arrival snapshot for every route serving `station`.
    fn fetch_arrivals(
        &self,
        station: &StationId,
    ) -> impl Future<Output = Result<Vec<RawArrivalRecord>, FeedError>> + Send;
}

/// Provides the live position of a single vehicle.
pub trait VehiclePositionSource: Send + Sync + 'static {
    /// Fetch the latest position report for `vehicle_id`, if the feed has one.
    fn fetch_position(
        &self,
        vehicle_id: &str,
    ) -> impl Future<Output = Result<Option<BusPosition>, FeedError>> + Send;
}
