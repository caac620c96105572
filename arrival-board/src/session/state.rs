//! Published session state.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::board::Classification;
use crate::catalog::CatalogError;
use crate::domain::StationId;
use crate::favorites::FavoritesError;
use crate::feed::FeedError;

/// Errors a session reports through its error slot.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// The feed answered, but with no routes to show
    #[error("no arrivals reported for station {0}")]
    EmptyResult(StationId),

    /// The catalog has no entry for this stop number
    #[error("station {0} is not in the catalog")]
    StationNotFound(StationId),

    #[error("failed to fetch arrivals: {0}")]
    Arrivals(#[source] Arc<FeedError>),

    #[error("failed to load catalog: {0}")]
    Catalog(#[source] CatalogError),

    #[error("favorites update failed: {0}")]
    Favorites(#[source] FavoritesError),

    /// A collaborator panicked mid-request
    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
}

/// Where the refresh cycle currently is.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// A refresh is in flight.
    Loading,
    /// The latest refresh produced a board.
    Ready,
    /// The latest refresh failed; the previous board is still published.
    Failed(SessionError),
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            SessionState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// One published board.
///
/// Each refresh and each countdown step publishes a fresh snapshot; readers
/// holding an older one are unaffected.
#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub classification: Classification,
    /// Next-station label reported by the first record of the last batch.
    pub next_station: Option<String>,
    /// When the feed data behind this board was fetched. `None` before the
    /// first successful refresh.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl BoardSnapshot {
    /// Whether this snapshot came from a refresh rather than being the
    /// initial placeholder.
    pub fn is_populated(&self) -> bool {
        self.refreshed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let station = StationId::parse("22009").unwrap();
        assert_eq!(
            SessionError::EmptyResult(station.clone()).to_string(),
            "no arrivals reported for station 22009"
        );
        assert_eq!(
            SessionError::StationNotFound(station).to_string(),
            "station 22009 is not in the catalog"
        );

        let err = SessionError::Arrivals(Arc::new(FeedError::Unauthorized));
        assert!(err.to_string().starts_with("failed to fetch arrivals: "));

        assert_eq!(
            SessionError::TaskPanicked("favorites").to_string(),
            "favorites task panicked"
        );
    }

    #[test]
    fn state_accessors() {
        assert!(SessionState::Ready.is_ready());
        assert!(SessionState::Loading.is_loading());
        assert!(SessionState::Idle.error().is_none());

        let station = StationId::parse("1").unwrap();
        let failed = SessionState::Failed(SessionError::EmptyResult(station));
        assert!(matches!(failed.error(), Some(SessionError::EmptyResult(_))));
    }

    #[test]
    fn placeholder_board_is_not_populated() {
        assert!(!BoardSnapshot::default().is_populated());
    }
}
