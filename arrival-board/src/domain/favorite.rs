//! User favorites.

use serde::{Deserialize, Serialize};

use super::{RouteId, StationId};

/// A route the user has starred at a particular station.
///
/// Identity is the (station, route) pair; the same route can be a favorite
/// at several stations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub station_id: StationId,
    pub route_id: RouteId,
}

impl FavoriteItem {
    pub fn new(station_id: StationId, route_id: RouteId) -> Self {
        Self {
            station_id,
            route_id,
        }
    }

    /// Whether this favorite belongs to the given station.
    pub fn is_at(&self, station: &StationId) -> bool {
        &self.station_id == station
    }
}
