//! Station and route identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid station or route identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

/// A station's public stop number (the "ARS id" printed on the stop sign).
///
/// Stop numbers are non-empty strings of ASCII digits. Leading zeros are
/// significant, so the value is kept as text rather than an integer.
///
/// # Examples
///
/// ```
/// use arrival_board::domain::StationId;
///
/// let id = StationId::parse("01234").unwrap();
/// assert_eq!(id.as_str(), "01234");
///
/// assert!(StationId::parse("").is_err());
/// assert!(StationId::parse("12a").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId(String);

impl StationId {
    /// Parse a stop number. Surrounding whitespace is trimmed.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidId {
                kind: "station",
                reason: "cannot be empty",
            });
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidId {
                kind: "station",
                reason: "must be ASCII digits",
            });
        }
        Ok(StationId(s.to_string()))
    }

    /// Returns the stop number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationId {
    type Error = InvalidId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.0
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.0)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque route identifier assigned by the feed.
///
/// Distinct from the route *number* shown to passengers: two routes can share
/// a display number in different cities, but never an id.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteId(String);

impl RouteId {
    /// Create a route id. Surrounding whitespace is trimmed; empty is rejected.
    pub fn parse(s: &str) -> Result<Self, InvalidId> {
        let s = s.trim();
        if s.is_empty() {
            return Err(InvalidId {
                kind: "route",
                reason: "cannot be empty",
            });
        }
        Ok(RouteId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RouteId {
    type Error = InvalidId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RouteId> for String {
    fn from(id: RouteId) -> Self {
        id.0
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({})", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Descriptive metadata for a station, resolved from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationMetadata {
    pub id: StationId,
    /// Display name, e.g. "Gwanghwamun".
    pub name: String,
    /// Which way buses at this stop are heading, e.g. "toward City Hall".
    pub direction: String,
}
