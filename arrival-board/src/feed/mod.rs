//! Real-time arrival feed.
//!
//! This module provides the client for the city bus information API, the
//! raw DTOs it returns, and the [`ArrivalSource`] seam that station sessions
//! fetch through.
//!
//! Key characteristics of the feed:
//! - Every field is a string, including numeric codes
//! - Arrival times are human-readable messages (see [`crate::domain::DecodedEta`])
//! - "No result" is reported as a result code, not an HTTP error

mod client;
mod error;
mod mock;
mod retry;
mod source;
mod types;
mod vehicle;

pub use client::{FeedClient, FeedClientConfig};
pub use error::FeedError;
pub use mock::MockArrivalFeed;
pub use retry::{RetryPolicy, retry};
pub use source::{ArrivalSource, VehiclePositionSource};
pub use types::{BusPosition, FeedResponse, MsgBody, MsgHeader, RawArrivalRecord};
pub use vehicle::fetch_vehicle_position;
