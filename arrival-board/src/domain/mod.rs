//! Domain types for the station arrival board.
//!
//! These types represent validated transit data. Identifiers enforce their
//! invariants at construction time; arrival messages are decoded fail-soft,
//! so a malformed message degrades to "no information" instead of an error.

mod eta;
mod favorite;
mod route;
mod station;

pub use eta::{DecodedEta, EtaStatus, RelativePosition};
pub use favorite::FavoriteItem;
pub use route::{Congestion, RouteCategory};
pub use station::{InvalidId, RouteId, StationId, StationMetadata};
