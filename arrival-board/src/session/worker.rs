//! The per-session event loop.
//!
//! The worker owns all mutable session state. Ticks, user commands and fetch
//! completions are handled one at a time from a single `select!` loop, so
//! decoding, classification and countdown steps never race each other.
//! Fetches run in a `JoinSet`; dropping the worker aborts whatever is still
//! in flight.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{self, JoinError, JoinSet};
use tracing::{debug, info, trace, warn};

use crate::board::{Classification, filter_known_routes};
use crate::catalog::{CatalogError, StationCatalog, find_station};
use crate::domain::{FavoriteItem, RouteId, StationId, StationMetadata};
use crate::favorites::{FavoritesError, FavoritesStore};
use crate::feed::{ArrivalSource, FeedError, RawArrivalRecord};

use super::SessionSources;
use super::config::SessionConfig;
use super::state::{BoardSnapshot, SessionError, SessionState};
use super::tick::Tick;

/// Requests from the session handle.
#[derive(Debug)]
pub(crate) enum Command {
    Refresh,
    Favorites(FavoritesJob),
}

/// One favorites round-trip: an optional edit followed by a re-list.
#[derive(Debug, Clone)]
pub(crate) enum FavoritesJob {
    Reload,
    Add(FavoriteItem),
    Remove(FavoriteItem),
}

/// What a child task was started for, so a panicked task can be settled
/// with its owner.
#[derive(Debug, Clone, Copy)]
enum TaskKind {
    Arrivals { seq: u64 },
    Stations,
    Routes,
    Favorites,
}

impl TaskKind {
    fn name(self) -> &'static str {
        match self {
            TaskKind::Arrivals { .. } => "arrivals",
            TaskKind::Stations => "station catalog",
            TaskKind::Routes => "route catalog",
            TaskKind::Favorites => "favorites",
        }
    }
}

enum Completion {
    Arrivals {
        seq: u64,
        result: Result<Vec<RawArrivalRecord>, FeedError>,
    },
    Stations(Result<Vec<StationMetadata>, CatalogError>),
    Routes(Result<Vec<RouteId>, CatalogError>),
    Favorites(Result<Vec<FavoriteItem>, FavoritesError>),
}

/// Sending halves of the published slots.
pub(crate) struct Publisher {
    pub(crate) board: watch::Sender<Arc<BoardSnapshot>>,
    pub(crate) station: watch::Sender<Option<StationMetadata>>,
    pub(crate) favorites: watch::Sender<Option<Arc<Vec<FavoriteItem>>>>,
    pub(crate) state: watch::Sender<SessionState>,
    pub(crate) error: watch::Sender<Option<SessionError>>,
    pub(crate) loaded: watch::Sender<bool>,
}

/// Monotonic request numbering.
///
/// A completion is applied only if it is newer than every completion
/// applied before it.
#[derive(Debug, Default)]
struct Sequencer {
    issued: u64,
    applied: u64,
}

impl Sequencer {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued
    }
}

/// Which slots have published their first value.
#[derive(Debug, Default)]
struct LoadProgress {
    board: bool,
    favorites: bool,
    station: bool,
    signalled: bool,
}

impl LoadProgress {
    fn complete(&self) -> bool {
        self.board && self.favorites && self.station
    }
}

pub(crate) struct Worker<A, C, F> {
    station: StationId,
    sources: SessionSources<A, C, F>,
    config: SessionConfig,
    publisher: Publisher,
    tasks: JoinSet<Completion>,
    running: HashMap<task::Id, TaskKind>,
    board: Arc<BoardSnapshot>,
    known_routes: Option<HashSet<RouteId>>,
    refreshes: Sequencer,
    favorites_busy: bool,
    favorites_queue: VecDeque<FavoritesJob>,
    progress: LoadProgress,
}

impl<A, C, F> Worker<A, C, F>
where
    A: ArrivalSource,
    C: StationCatalog,
    F: FavoritesStore,
{
    pub(crate) fn new(
        station: StationId,
        sources: SessionSources<A, C, F>,
        config: SessionConfig,
        publisher: Publisher,
    ) -> Self {
        Self {
            station,
            sources,
            config,
            publisher,
            tasks: JoinSet::new(),
            running: HashMap::new(),
            board: Arc::new(BoardSnapshot::default()),
            known_routes: None,
            refreshes: Sequencer::default(),
            favorites_busy: false,
            favorites_queue: VecDeque::new(),
            progress: LoadProgress::default(),
        }
    }

    pub(crate) async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut ticks: broadcast::Receiver<Tick>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        self.bind();
        let mut ticks_open = true;

        loop {
            tokio::select! {
                // Fires on explicit shutdown and when the handle is dropped
                _ = &mut shutdown => break,

                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },

                tick = ticks.recv(), if ticks_open => match tick {
                    Ok(Tick::OneSecond) => self.countdown(),
                    Ok(Tick::ThirtySeconds) => self.start_refresh("timer"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(station = %self.station, skipped, "session fell behind the tick source");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(station = %self.station, "tick source closed");
                        ticks_open = false;
                    }
                },

                Some(joined) = self.tasks.join_next_with_id() => self.handle_joined(joined),
            }
        }

        self.tasks.abort_all();
        self.running.clear();
        debug!(station = %self.station, "session stopped");
    }

    /// Kick off everything a freshly bound session needs.
    fn bind(&mut self) {
        info!(station = %self.station, "binding session");

        let catalog = Arc::clone(&self.sources.catalog);
        self.spawn_task(TaskKind::Stations, async move {
            Completion::Stations(catalog.fetch_stations().await)
        });

        if self.config.filter_unknown_routes {
            let catalog = Arc::clone(&self.sources.catalog);
            self.spawn_task(TaskKind::Routes, async move {
                Completion::Routes(catalog.fetch_routes().await)
            });
        }

        self.enqueue_favorites(FavoritesJob::Reload);

        if self.config.refresh_on_bind {
            self.start_refresh("bind");
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Refresh => self.start_refresh("explicit"),
            Command::Favorites(job) => self.enqueue_favorites(job),
        }
    }

    fn spawn_task<Fut>(&mut self, kind: TaskKind, fut: Fut)
    where
        Fut: Future<Output = Completion> + Send + 'static,
    {
        let handle = self.tasks.spawn(fut);
        self.running.insert(handle.id(), kind);
    }

    fn handle_joined(&mut self, joined: Result<(task::Id, Completion), JoinError>) {
        let completion = match joined {
            Ok((id, completion)) => {
                self.running.remove(&id);
                completion
            }
            Err(e) => {
                let kind = self.running.remove(&e.id());
                if let Some(kind) = kind
                    && !e.is_cancelled()
                {
                    warn!(station = %self.station, task = kind.name(), error = %e, "session task panicked");
                    self.settle_panicked(kind);
                }
                return;
            }
        };

        match completion {
            Completion::Arrivals { seq, result } => self.apply_arrivals(seq, result),
            Completion::Stations(result) => self.apply_stations(result),
            Completion::Routes(result) => self.apply_routes(result),
            Completion::Favorites(result) => self.apply_favorites(result),
        }
    }

    /// Give a panicked task's owner the same outcome as a failed fetch.
    fn settle_panicked(&mut self, kind: TaskKind) {
        let err = SessionError::TaskPanicked(kind.name());
        match kind {
            TaskKind::Arrivals { seq } => {
                if self.refreshes.accept(seq) {
                    let drives_state = self.refreshes.is_latest(seq);
                    self.report(err, drives_state);
                }
            }
            TaskKind::Stations => self.report(err, true),
            TaskKind::Routes => self.report(err, false),
            TaskKind::Favorites => {
                self.favorites_busy = false;
                self.report(err, false);
                self.start_next_favorites();
            }
        }
    }

    fn start_refresh(&mut self, trigger: &'static str) {
        let seq = self.refreshes.issue();
        debug!(station = %self.station, seq, trigger, "refresh issued");
        self.publisher.state.send_replace(SessionState::Loading);

        let source = Arc::clone(&self.sources.arrivals);
        let station = self.station.clone();
        self.spawn_task(TaskKind::Arrivals { seq }, async move {
            let result = source.fetch_arrivals(&station).await;
            Completion::Arrivals { seq, result }
        });
    }

    fn apply_arrivals(&mut self, seq: u64, result: Result<Vec<RawArrivalRecord>, FeedError>) {
        if !self.refreshes.accept(seq) {
            debug!(station = %self.station, seq, "discarding stale refresh");
            return;
        }
        let drives_state = self.refreshes.is_latest(seq);

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                self.report(SessionError::Arrivals(Arc::new(e)), drives_state);
                return;
            }
        };

        let fetched = batch.len();
        let batch = match &self.known_routes {
            Some(known) if self.config.filter_unknown_routes => filter_known_routes(batch, known),
            _ => batch,
        };
        if batch.len() != fetched {
            trace!(
                station = %self.station,
                dropped = fetched - batch.len(),
                "filtered routes missing from the catalog"
            );
        }

        if batch.is_empty() {
            self.report(SessionError::EmptyResult(self.station.clone()), drives_state);
            return;
        }

        let classification = Classification::classify(&batch);
        debug!(
            station = %self.station,
            seq,
            active = classification.active().len(),
            inactive = classification.inactive().len(),
            "board refreshed"
        );

        self.publish_board(BoardSnapshot {
            classification,
            next_station: batch.first().map(|raw| raw.next_station.clone()),
            refreshed_at: Some(Utc::now()),
        });
        if drives_state {
            self.publisher.state.send_replace(SessionState::Ready);
        }

        self.progress.board = true;
        self.check_loaded();
    }

    /// One local countdown step for every active route.
    fn countdown(&mut self) {
        if self.board.classification.active().is_empty() {
            return;
        }

        let board = BoardSnapshot {
            classification: self.board.classification.descended(),
            next_station: self.board.next_station.clone(),
            refreshed_at: self.board.refreshed_at,
        };
        self.publish_board(board);
    }

    fn publish_board(&mut self, board: BoardSnapshot) {
        self.board = Arc::new(board);
        self.publisher.board.send_replace(Arc::clone(&self.board));
    }

    fn apply_stations(&mut self, result: Result<Vec<StationMetadata>, CatalogError>) {
        let stations = match result {
            Ok(stations) => stations,
            Err(e) => {
                self.report(SessionError::Catalog(e), true);
                return;
            }
        };

        match find_station(&stations, &self.station) {
            Some(metadata) => {
                debug!(station = %self.station, name = %metadata.name, "station resolved");
                self.publisher.station.send_replace(Some(metadata));
                self.progress.station = true;
                self.check_loaded();
            }
            None => self.report(SessionError::StationNotFound(self.station.clone()), true),
        }
    }

    fn apply_routes(&mut self, result: Result<Vec<RouteId>, CatalogError>) {
        match result {
            Ok(routes) if routes.is_empty() => {
                debug!(station = %self.station, "route catalog is empty, not filtering");
            }
            Ok(routes) => {
                debug!(station = %self.station, routes = routes.len(), "route catalog loaded");
                self.known_routes = Some(routes.into_iter().collect());
            }
            // The board still works unfiltered
            Err(e) => self.report(SessionError::Catalog(e), false),
        }
    }

    fn enqueue_favorites(&mut self, job: FavoritesJob) {
        self.favorites_queue.push_back(job);
        self.start_next_favorites();
    }

    /// Favorites jobs run one at a time so each re-list observes every edit
    /// issued before it.
    fn start_next_favorites(&mut self) {
        if self.favorites_busy {
            return;
        }
        let Some(job) = self.favorites_queue.pop_front() else {
            return;
        };
        self.favorites_busy = true;

        let store = Arc::clone(&self.sources.favorites);
        self.spawn_task(TaskKind::Favorites, async move {
            let result = async {
                match &job {
                    FavoritesJob::Reload => {}
                    FavoritesJob::Add(item) => store.add(item).await?,
                    FavoritesJob::Remove(item) => store.remove(item).await?,
                }
                store.list().await
            }
            .await;
            Completion::Favorites(result)
        });
    }

    fn apply_favorites(&mut self, result: Result<Vec<FavoriteItem>, FavoritesError>) {
        self.favorites_busy = false;

        match result {
            Ok(items) => {
                let here: Vec<FavoriteItem> = items
                    .into_iter()
                    .filter(|item| item.is_at(&self.station))
                    .collect();
                debug!(station = %self.station, favorites = here.len(), "favorites updated");
                self.publisher.favorites.send_replace(Some(Arc::new(here)));
                self.progress.favorites = true;
                self.check_loaded();
            }
            Err(e) => self.report(SessionError::Favorites(e), false),
        }

        self.start_next_favorites();
    }

    /// Write `err` to the error slot, and to the state when it describes the
    /// outcome of the latest request.
    fn report(&mut self, err: SessionError, drives_state: bool) {
        warn!(station = %self.station, error = %err, "session error");
        self.publisher.error.send_replace(Some(err.clone()));
        if drives_state {
            self.publisher.state.send_replace(SessionState::Failed(err));
        }
    }

    fn check_loaded(&mut self) {
        if self.progress.signalled || !self.progress.complete() {
            return;
        }
        self.progress.signalled = true;
        info!(station = %self.station, "session loaded");
        self.publisher.loaded.send_replace(true);
    }
}
