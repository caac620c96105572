//! Vehicle position lookups.
//!
//! Unlike station refreshes, which wait for the next refresh tick or a
//! manual refresh, a position lookup re-issues the request on transport
//! failure according to a [`RetryPolicy`].

use tracing::debug;

use super::error::FeedError;
use super::retry::{RetryPolicy, retry};
use super::source::VehiclePositionSource;
use super::types::BusPosition;

/// Fetch a vehicle's latest position, retrying transport failures.
///
/// Returns `Ok(None)` when the feed has no report for the vehicle; that is
/// an answer, not a failure, and is not retried.
pub async fn fetch_vehicle_position<S: VehiclePositionSource>(
    source: &S,
    vehicle_id: &str,
    policy: &RetryPolicy,
) -> Result<Option<BusPosition>, FeedError> {
    let position = retry(policy, || source.fetch_position(vehicle_id)).await?;
    debug!(
        vehicle_id,
        found = position.is_some(),
        "vehicle position fetched"
    );
    Ok(position)
}
