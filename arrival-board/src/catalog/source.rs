//! Catalog source trait and lookup helpers.

use std::future::Future;

use crate::domain::{RouteId, StationId, StationMetadata};

use super::error::CatalogError;

/// Provides the slow-changing station and route catalog.
pub trait StationCatalog: Send + Sync + 'static {
    /// Fetch every station in the catalog.
    fn fetch_stations(
        &self,
    ) -> impl Future<Output = Result<Vec<StationMetadata>, CatalogError>> + Send;

    /// Fetch the ids of every route the catalog knows about.
    fn fetch_routes(&self) -> impl Future<Output = Result<Vec<RouteId>, CatalogError>> + Send;
}

/// Find the catalog entry for `id`.
///
/// If the catalog lists a stop number more than once, the first entry wins.
pub fn find_station(stations: &[StationMetadata], id: &StationId) -> Option<StationMetadata> {
    stations.iter().find(|s| &s.id == id).cloned()
}
