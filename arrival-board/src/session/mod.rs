//! Station sessions.
//!
//! A [`StationSession`] keeps one station's board current: it refreshes
//! arrivals on the slow tick, counts down between refreshes on the fast
//! tick, resolves the station's metadata once, and tracks the user's
//! favorites at that station. Everything it knows is published through a
//! [`SessionView`] of `watch` slots.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use arrival_board::catalog::FileCatalog;
//! use arrival_board::domain::StationId;
//! use arrival_board::favorites::MemoryFavorites;
//! use arrival_board::feed::{FeedClient, FeedClientConfig};
//! use arrival_board::session::{
//!     IntervalTicker, SessionConfig, SessionSources, StationSession, TickerConfig,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let sources = SessionSources::new(
//!     Arc::new(FeedClient::new(FeedClientConfig::new("service-key"))?),
//!     Arc::new(FileCatalog::new("stations.json")),
//!     Arc::new(MemoryFavorites::new()),
//! );
//! let ticker = IntervalTicker::start(TickerConfig::default());
//! let station = StationId::parse("22009")?;
//!
//! let session = StationSession::spawn(station, sources, &ticker, SessionConfig::default());
//! let mut board = session.view().subscribe_board();
//! board.changed().await?;
//! println!("{} routes", board.borrow().classification.record_count());
//!
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod state;
mod tick;
mod worker;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::catalog::StationCatalog;
use crate::domain::{FavoriteItem, StationId, StationMetadata};
use crate::favorites::FavoritesStore;
use crate::feed::ArrivalSource;

pub use config::SessionConfig;
pub use state::{BoardSnapshot, SessionError, SessionState};
pub use tick::{IntervalTicker, ManualTicker, Tick, TickSource, TickerConfig};

use worker::{Command, FavoritesJob, Publisher, Worker};

/// The collaborators a session reads from.
///
/// Held behind `Arc`s so one client, catalog and favorites store can serve
/// many sessions.
pub struct SessionSources<A, C, F> {
    pub arrivals: Arc<A>,
    pub catalog: Arc<C>,
    pub favorites: Arc<F>,
}

impl<A, C, F> SessionSources<A, C, F> {
    pub fn new(arrivals: Arc<A>, catalog: Arc<C>, favorites: Arc<F>) -> Self {
        Self {
            arrivals,
            catalog,
            favorites,
        }
    }
}

impl<A, C, F> Clone for SessionSources<A, C, F> {
    fn clone(&self) -> Self {
        Self {
            arrivals: Arc::clone(&self.arrivals),
            catalog: Arc::clone(&self.catalog),
            favorites: Arc::clone(&self.favorites),
        }
    }
}

/// Read side of a session.
///
/// Getters return the current value; `subscribe_*` hand out receivers for
/// awaiting changes. A view stays readable after its session stops, frozen
/// at the last published values.
#[derive(Debug, Clone)]
pub struct SessionView {
    board: watch::Receiver<Arc<BoardSnapshot>>,
    station: watch::Receiver<Option<StationMetadata>>,
    favorites: watch::Receiver<Option<Arc<Vec<FavoriteItem>>>>,
    state: watch::Receiver<SessionState>,
    error: watch::Receiver<Option<SessionError>>,
    loaded: watch::Receiver<bool>,
}

impl SessionView {
    pub fn board(&self) -> Arc<BoardSnapshot> {
        Arc::clone(&self.board.borrow())
    }

    /// Station metadata, once resolved from the catalog.
    pub fn station(&self) -> Option<StationMetadata> {
        self.station.borrow().clone()
    }

    /// The user's favorites at this station, once listed.
    pub fn favorites(&self) -> Option<Arc<Vec<FavoriteItem>>> {
        self.favorites.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The most recent error of any kind, if one has occurred.
    pub fn last_error(&self) -> Option<SessionError> {
        self.error.borrow().clone()
    }

    /// True once board, favorites and station metadata have all been
    /// published. Never goes back to false.
    pub fn is_loaded(&self) -> bool {
        *self.loaded.borrow()
    }

    pub fn subscribe_board(&self) -> watch::Receiver<Arc<BoardSnapshot>> {
        self.board.clone()
    }

    pub fn subscribe_station(&self) -> watch::Receiver<Option<StationMetadata>> {
        self.station.clone()
    }

    pub fn subscribe_favorites(&self) -> watch::Receiver<Option<Arc<Vec<FavoriteItem>>>> {
        self.favorites.clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<Option<SessionError>> {
        self.error.clone()
    }

    pub fn subscribe_loaded(&self) -> watch::Receiver<bool> {
        self.loaded.clone()
    }
}

/// Handle to a running station session.
///
/// Dropping the handle tears the session down just like [`shutdown`], minus
/// waiting for the worker to finish.
///
/// [`shutdown`]: StationSession::shutdown
pub struct StationSession {
    station: StationId,
    view: SessionView,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: oneshot::Sender<()>,
    worker: JoinHandle<()>,
}

impl StationSession {
    /// Bind a session to `station` and start its worker.
    ///
    /// Subscribes to `ticks` immediately, so ticks fired after this returns
    /// reach the session. Must be called from within a tokio runtime.
    pub fn spawn<A, C, F>(
        station: StationId,
        sources: SessionSources<A, C, F>,
        ticks: &impl TickSource,
        config: SessionConfig,
    ) -> Self
    where
        A: ArrivalSource,
        C: StationCatalog,
        F: FavoritesStore,
    {
        let (board_tx, board) = watch::channel(Arc::new(BoardSnapshot::default()));
        let (station_tx, station_rx) = watch::channel(None);
        let (favorites_tx, favorites) = watch::channel(None);
        let (state_tx, state) = watch::channel(SessionState::Idle);
        let (error_tx, error) = watch::channel(None);
        let (loaded_tx, loaded) = watch::channel(false);

        let publisher = Publisher {
            board: board_tx,
            station: station_tx,
            favorites: favorites_tx,
            state: state_tx,
            error: error_tx,
            loaded: loaded_tx,
        };

        let (commands, command_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = oneshot::channel();

        let worker = Worker::new(station.clone(), sources, config, publisher);
        let worker = tokio::spawn(worker.run(command_rx, ticks.subscribe(), shutdown_rx));

        Self {
            station,
            view: SessionView {
                board,
                station: station_rx,
                favorites,
                state,
                error,
                loaded,
            },
            commands,
            shutdown,
            worker,
        }
    }

    pub fn station_id(&self) -> &StationId {
        &self.station
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    /// Fetch arrivals now rather than waiting for the next refresh tick.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Star a route at this station. The published favorites update once
    /// the store has accepted the change.
    pub fn add_favorite(&self, item: FavoriteItem) {
        self.send(Command::Favorites(FavoritesJob::Add(item)));
    }

    pub fn remove_favorite(&self, item: FavoriteItem) {
        self.send(Command::Favorites(FavoritesJob::Remove(item)));
    }

    /// Re-list favorites, e.g. after another session edited the store.
    pub fn reload_favorites(&self) {
        self.send(Command::Favorites(FavoritesJob::Reload));
    }

    /// Stop the session and wait for its worker to exit.
    ///
    /// In-flight fetches are aborted and the tick subscription is released.
    pub async fn shutdown(self) {
        let Self {
            station,
            shutdown,
            worker,
            ..
        } = self;

        let _ = shutdown.send(());
        if let Err(e) = worker.await {
            debug!(station = %station, error = %e, "session worker ended abnormally");
        }
    }

    fn send(&self, command: Command) {
        // A stopped worker has dropped its receiver; commands become no-ops
        if self.commands.send(command).is_err() {
            debug!(station = %self.station, "command sent to a stopped session");
        }
    }
}
