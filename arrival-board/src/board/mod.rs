//! Arrival board model.
//!
//! Turns raw feed batches into the board a station session publishes:
//! normalized records, grouped by route category, split by whether live
//! information is available, with a countdown step applied between
//! refreshes.

mod classify;
mod group;
mod record;

pub use classify::{Activity, Classification, DisplayOrder, SectionKey, filter_known_routes};
pub use group::RouteGroup;
pub use record::ArrivalRecord;
