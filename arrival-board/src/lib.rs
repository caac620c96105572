//! Live bus arrival boards.
//!
//! Keeps a station's arrival board current between network refreshes:
//!
//! - [`domain`]: identifiers, route categories and the arrival-time codec.
//! - [`feed`]: the arrival feed client, its DTOs and a scripted mock.
//! - [`board`]: normalizing, grouping and counting down arrival records.
//! - [`catalog`]: station metadata and the list of known routes.
//! - [`favorites`]: where starred routes are stored.
//! - [`session`]: one station's live board, driven by ticks.

pub mod board;
pub mod catalog;
pub mod domain;
pub mod favorites;
pub mod feed;
pub mod session;
