use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use super::*;
use crate::catalog::CatalogError;
use crate::domain::{EtaStatus, RouteCategory, RouteId};
use crate::favorites::{FavoritesError, MemoryFavorites};
use crate::feed::{FeedError, MockArrivalFeed, RawArrivalRecord};

const STATION: &str = "22009";

fn station() -> StationId {
    StationId::parse(STATION).unwrap()
}

fn arrival(route_type: &str, number: &str, first: &str, second: &str) -> RawArrivalRecord {
    RawArrivalRecord {
        route_type: route_type.to_string(),
        congestion: "4".to_string(),
        next_station: format!("after {number}"),
        route_number: number.to_string(),
        station_ord: "12".to_string(),
        route_id: format!("1001{number}"),
        first_arrival: first.to_string(),
        second_arrival: second.to_string(),
    }
}

fn favorite(station: &str, route: &str) -> FavoriteItem {
    FavoriteItem::new(
        StationId::parse(station).unwrap(),
        RouteId::parse(route).unwrap(),
    )
}

struct StaticCatalog {
    stations: Vec<StationMetadata>,
    routes: Vec<RouteId>,
}

impl StaticCatalog {
    fn with_station() -> Self {
        Self {
            stations: vec![StationMetadata {
                id: station(),
                name: "Gwanghwamun".to_string(),
                direction: "toward City Hall".to_string(),
            }],
            routes: Vec::new(),
        }
    }

    fn with_routes(mut self, routes: &[&str]) -> Self {
        self.routes = routes.iter().map(|r| RouteId::parse(r).unwrap()).collect();
        self
    }
}

impl StationCatalog for StaticCatalog {
    async fn fetch_stations(&self) -> Result<Vec<StationMetadata>, CatalogError> {
        Ok(self.stations.clone())
    }

    async fn fetch_routes(&self) -> Result<Vec<RouteId>, CatalogError> {
        Ok(self.routes.clone())
    }
}

/// Lists fine, refuses every edit.
struct ReadOnlyFavorites(Vec<FavoriteItem>);

impl FavoritesStore for ReadOnlyFavorites {
    async fn list(&self) -> Result<Vec<FavoriteItem>, FavoritesError> {
        Ok(self.0.clone())
    }

    async fn add(&self, _item: &FavoriteItem) -> Result<(), FavoritesError> {
        Err(FavoritesError::Storage {
            message: "read-only".to_string(),
        })
    }

    async fn remove(&self, _item: &FavoriteItem) -> Result<(), FavoritesError> {
        Err(FavoritesError::Storage {
            message: "read-only".to_string(),
        })
    }
}

struct Harness<C, F> {
    feed: Arc<MockArrivalFeed>,
    catalog: Arc<C>,
    favorites: Arc<F>,
    ticker: ManualTicker,
}

impl Harness<StaticCatalog, MemoryFavorites> {
    fn new() -> Self {
        Self::with(StaticCatalog::with_station(), MemoryFavorites::new())
    }
}

impl<C: StationCatalog, F: FavoritesStore> Harness<C, F> {
    fn with(catalog: C, favorites: F) -> Self {
        Self {
            feed: Arc::new(MockArrivalFeed::new()),
            catalog: Arc::new(catalog),
            favorites: Arc::new(favorites),
            ticker: ManualTicker::new(),
        }
    }

    fn spawn(&self, config: SessionConfig) -> StationSession {
        let sources = SessionSources::new(
            Arc::clone(&self.feed),
            Arc::clone(&self.catalog),
            Arc::clone(&self.favorites),
        );
        StationSession::spawn(station(), sources, &self.ticker, config)
    }
}

async fn wait_until<T>(rx: &mut watch::Receiver<T>, pred: impl FnMut(&T) -> bool) {
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(pred))
        .await
        .expect("timed out waiting for session")
        .expect("session stopped");
}

async fn wait_ready(view: &SessionView) {
    wait_until(&mut view.subscribe_state(), SessionState::is_ready).await;
}

fn first_status(board: &BoardSnapshot, category: RouteCategory) -> Option<EtaStatus> {
    board
        .classification
        .active()
        .get(&category)
        .and_then(|group| group.first())
        .map(|record| record.first.status)
}

fn route_numbers(board: &BoardSnapshot) -> Vec<String> {
    board
        .classification
        .sections()
        .flat_map(|(_, group)| group.iter().map(|r| r.route_number.clone()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn one_second_tick_counts_down() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "5분후")]);

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;

    let board = session.view().board();
    assert_eq!(
        first_status(&board, RouteCategory::Trunk),
        Some(EtaStatus::CountingDown(120))
    );
    assert_eq!(board.next_station.as_deref(), Some("after 472"));

    assert_eq!(h.ticker.fire(Tick::OneSecond), 1);
    wait_until(&mut session.view().subscribe_board(), |b| {
        first_status(b, RouteCategory::Trunk) == Some(EtaStatus::CountingDown(119))
    })
    .await;

    let board = session.view().board();
    let group = &board.classification.active()[&RouteCategory::Trunk];
    assert!(group.changed_by_timer());
    assert_eq!(group.first().unwrap().second.status, EtaStatus::CountingDown(299));
    // Counting down never hits the network
    assert_eq!(h.feed.call_count(), 1);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn thirty_second_tick_refreshes() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);
    h.feed
        .push_batch(&station(), vec![arrival("4", "7016", "곧 도착", "")]);

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;
    assert_eq!(route_numbers(&session.view().board()), vec!["472"]);

    h.ticker.fire(Tick::ThirtySeconds);
    wait_until(&mut session.view().subscribe_board(), |b| {
        first_status(b, RouteCategory::Branch) == Some(EtaStatus::Imminent)
    })
    .await;

    assert_eq!(route_numbers(&session.view().board()), vec!["7016"]);
    assert_eq!(h.feed.call_count(), 2);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn empty_batch_fails_and_keeps_previous_board() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);
    h.feed.push_batch(&station(), Vec::new());

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;
    let before = session.view().board();

    session.refresh();
    wait_until(&mut session.view().subscribe_state(), |s| {
        matches!(s, SessionState::Failed(_))
    })
    .await;

    assert!(matches!(
        session.view().state(),
        SessionState::Failed(SessionError::EmptyResult(_))
    ));
    assert!(matches!(
        session.view().last_error(),
        Some(SessionError::EmptyResult(_))
    ));

    let after = session.view().board();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.classification.record_count(), 1);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_reported() {
    let h = Harness::new();
    h.feed.push_failure(&station(), "upstream down");

    let session = h.spawn(SessionConfig::default());
    wait_until(&mut session.view().subscribe_state(), |s| {
        matches!(s, SessionState::Failed(_))
    })
    .await;

    assert!(matches!(
        session.view().state(),
        SessionState::Failed(SessionError::Arrivals(_))
    ));
    assert!(!session.view().board().is_populated());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn stale_refresh_is_discarded() {
    let h = Harness::new();
    // The bind refresh is slow; the explicit one answers straight away
    h.feed.push_delayed_batch(
        &station(),
        Duration::from_secs(10),
        vec![arrival("3", "472", "120", "")],
    );
    h.feed
        .push_batch(&station(), vec![arrival("4", "7016", "300", "")]);

    let session = h.spawn(SessionConfig::default());
    session.refresh();

    wait_until(&mut session.view().subscribe_board(), |b| {
        route_numbers(b) == ["7016"]
    })
    .await;

    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(h.feed.call_count(), 2);
    assert_eq!(route_numbers(&session.view().board()), vec!["7016"]);
    assert!(session.view().state().is_ready());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn favorites_follow_the_store() {
    let h = Harness::with(
        StaticCatalog::with_station(),
        MemoryFavorites::with_items([
            favorite("11111", "100100118"),
            favorite(STATION, "100100118"),
        ]),
    );
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    let mut favorites = session.view().subscribe_favorites();
    wait_until(&mut favorites, |f| f.as_ref().is_some_and(|f| f.len() == 1)).await;

    let added = favorite(STATION, "1001472");
    session.add_favorite(added.clone());
    wait_until(&mut favorites, |f| f.as_ref().is_some_and(|f| f.len() == 2)).await;

    let listed = session.view().favorites().unwrap();
    assert!(listed.contains(&added));
    assert!(listed.iter().all(|item| item.is_at(&station())));
    assert!(h.favorites.list().await.unwrap().contains(&added));

    session.remove_favorite(added.clone());
    wait_until(&mut favorites, |f| f.as_ref().is_some_and(|f| f.len() == 1)).await;
    assert!(!h.favorites.list().await.unwrap().contains(&added));

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rejected_favorite_edit_keeps_list() {
    let h = Harness::with(
        StaticCatalog::with_station(),
        ReadOnlyFavorites(vec![favorite(STATION, "100100118")]),
    );
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    wait_until(&mut session.view().subscribe_favorites(), Option::is_some).await;
    wait_ready(session.view()).await;

    session.add_favorite(favorite(STATION, "1001472"));
    wait_until(&mut session.view().subscribe_errors(), |e| {
        matches!(e, Some(SessionError::Favorites(_)))
    })
    .await;

    assert_eq!(session.view().favorites().unwrap().len(), 1);
    // Favorites errors do not disturb the refresh cycle
    assert!(session.view().state().is_ready());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn loaded_is_raised_once() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    let mut loaded = session.view().subscribe_loaded();
    wait_until(&mut loaded, |l| *l).await;
    loaded.borrow_and_update();

    let view = session.view();
    assert!(view.board().is_populated());
    assert_eq!(view.station().unwrap().name, "Gwanghwamun");
    assert!(view.favorites().unwrap().is_empty());

    h.ticker.fire(Tick::OneSecond);
    h.ticker.fire(Tick::ThirtySeconds);
    session.refresh();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(view.is_loaded());
    assert!(!loaded.has_changed().unwrap());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn missing_station_is_reported() {
    let catalog = StaticCatalog {
        stations: Vec::new(),
        routes: Vec::new(),
    };
    let h = Harness::with(catalog, MemoryFavorites::new());
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    wait_until(&mut session.view().subscribe_errors(), |e| {
        matches!(e, Some(SessionError::StationNotFound(_)))
    })
    .await;
    wait_until(&mut session.view().subscribe_board(), |b| b.is_populated()).await;

    assert!(session.view().station().is_none());
    assert!(!session.view().is_loaded());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn routes_missing_from_catalog_are_filtered() {
    let batch = vec![
        arrival("3", "472", "120", ""),
        arrival("3", "9999", "60", ""),
    ];
    let h = Harness::with(
        StaticCatalog::with_station().with_routes(&["1001472"]),
        MemoryFavorites::new(),
    );
    // Delayed so the route list is in place before the batch lands
    h.feed
        .push_delayed_batch(&station(), Duration::from_secs(1), batch.clone());

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;
    assert_eq!(route_numbers(&session.view().board()), vec!["472"]);
    session.shutdown().await;

    let h = Harness::with(
        StaticCatalog::with_station().with_routes(&["1001472"]),
        MemoryFavorites::new(),
    );
    h.feed
        .push_delayed_batch(&station(), Duration::from_secs(1), batch);

    let session = h.spawn(SessionConfig::default().with_route_filter(false));
    wait_ready(session.view()).await;
    assert_eq!(route_numbers(&session.view().board()), vec!["472", "9999"]);
    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn filtering_everything_is_an_empty_result() {
    let h = Harness::with(
        StaticCatalog::with_station().with_routes(&["1001472"]),
        MemoryFavorites::new(),
    );
    h.feed.push_delayed_batch(
        &station(),
        Duration::from_secs(1),
        vec![arrival("3", "9999", "60", "")],
    );

    let session = h.spawn(SessionConfig::default());
    wait_until(&mut session.view().subscribe_state(), |s| {
        matches!(s, SessionState::Failed(SessionError::EmptyResult(_)))
    })
    .await;

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn no_refresh_on_bind_waits_for_tick() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default().with_refresh_on_bind(false));
    wait_until(&mut session.view().subscribe_favorites(), Option::is_some).await;
    assert_eq!(h.feed.call_count(), 0);
    assert!(matches!(session.view().state(), SessionState::Idle));

    h.ticker.fire(Tick::ThirtySeconds);
    wait_ready(session.view()).await;
    assert_eq!(h.feed.call_count(), 1);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_releases_everything() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;
    assert_eq!(h.ticker.subscriber_count(), 1);

    let view = session.view().clone();
    let before = view.board();
    session.shutdown().await;

    assert_eq!(h.ticker.subscriber_count(), 0);
    assert_eq!(h.ticker.fire(Tick::OneSecond), 0);

    let mut board = view.subscribe_board();
    board.borrow_and_update();
    assert!(board.changed().await.is_err());
    assert!(Arc::ptr_eq(&before, &view.board()));
}

#[tokio::test(start_paused = true)]
async fn shutdown_abandons_in_flight_fetch() {
    let h = Harness::new();
    h.feed.push_delayed_batch(
        &station(),
        Duration::from_secs(60),
        vec![arrival("3", "472", "120", "")],
    );

    let session = h.spawn(SessionConfig::default());
    let view = session.view().clone();
    wait_until(&mut view.subscribe_state(), SessionState::is_loading).await;

    session.shutdown().await;
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(!view.board().is_populated());
    assert!(view.state().is_loading());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_session() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;
    drop(session);

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.ticker.subscriber_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("worker did not stop");
}

/// Panics on the first `list`, then behaves like the wrapped store.
struct FlakyListFavorites {
    panicked: AtomicBool,
    inner: MemoryFavorites,
}

impl FlakyListFavorites {
    fn new() -> Self {
        Self {
            panicked: AtomicBool::new(false),
            inner: MemoryFavorites::new(),
        }
    }
}

impl FavoritesStore for FlakyListFavorites {
    async fn list(&self) -> Result<Vec<FavoriteItem>, FavoritesError> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("favorites backend crashed");
        }
        self.inner.list().await
    }

    async fn add(&self, item: &FavoriteItem) -> Result<(), FavoritesError> {
        self.inner.add(item).await
    }

    async fn remove(&self, item: &FavoriteItem) -> Result<(), FavoritesError> {
        self.inner.remove(item).await
    }
}

/// Accepts every add but stores a different item than the one requested.
struct RewritingFavorites {
    stored_instead: FavoriteItem,
    inner: MemoryFavorites,
}

impl FavoritesStore for RewritingFavorites {
    async fn list(&self) -> Result<Vec<FavoriteItem>, FavoritesError> {
        self.inner.list().await
    }

    async fn add(&self, _item: &FavoriteItem) -> Result<(), FavoritesError> {
        self.inner.add(&self.stored_instead).await
    }

    async fn remove(&self, item: &FavoriteItem) -> Result<(), FavoritesError> {
        self.inner.remove(item).await
    }
}

struct PanickingFeed;

impl ArrivalSource for PanickingFeed {
    async fn fetch_arrivals(
        &self,
        _station: &StationId,
    ) -> Result<Vec<RawArrivalRecord>, FeedError> {
        panic!("feed client crashed")
    }
}

#[tokio::test(start_paused = true)]
async fn favorites_recover_after_store_panic() {
    let h = Harness::with(StaticCatalog::with_station(), FlakyListFavorites::new());
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    wait_until(&mut session.view().subscribe_errors(), |e| {
        matches!(e, Some(SessionError::TaskPanicked("favorites")))
    })
    .await;
    assert!(session.view().favorites().is_none());

    let added = favorite(STATION, "1001472");
    session.add_favorite(added.clone());
    wait_until(&mut session.view().subscribe_favorites(), |f| {
        f.as_ref().is_some_and(|f| f.len() == 1)
    })
    .await;

    assert_eq!(h.favorites.inner.list().await.unwrap(), vec![added.clone()]);
    assert_eq!(*session.view().favorites().unwrap(), vec![added]);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn panicked_refresh_fails_the_session() {
    let sources = SessionSources::new(
        Arc::new(PanickingFeed),
        Arc::new(StaticCatalog::with_station()),
        Arc::new(MemoryFavorites::new()),
    );
    let ticker = ManualTicker::new();

    let session = StationSession::spawn(station(), sources, &ticker, SessionConfig::default());
    wait_until(&mut session.view().subscribe_state(), |s| {
        matches!(s, SessionState::Failed(SessionError::TaskPanicked("arrivals")))
    })
    .await;
    assert!(!session.view().board().is_populated());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn countdown_continues_during_slow_refresh() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);
    h.feed.push_delayed_batch(
        &station(),
        Duration::from_secs(20),
        vec![arrival("3", "472", "300", "")],
    );

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;

    session.refresh();
    wait_until(&mut session.view().subscribe_state(), SessionState::is_loading).await;

    for _ in 0..3 {
        h.ticker.fire(Tick::OneSecond);
    }
    wait_until(&mut session.view().subscribe_board(), |b| {
        first_status(b, RouteCategory::Trunk) == Some(EtaStatus::CountingDown(117))
    })
    .await;
    assert!(session.view().state().is_loading());

    wait_ready(session.view()).await;
    let board = session.view().board();
    assert_eq!(
        first_status(&board, RouteCategory::Trunk),
        Some(EtaStatus::CountingDown(300))
    );
    assert!(!board.classification.active()[&RouteCategory::Trunk].changed_by_timer());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn favorites_show_what_the_store_kept() {
    let stored_instead = favorite(STATION, "100100999");
    let h = Harness::with(
        StaticCatalog::with_station(),
        RewritingFavorites {
            stored_instead: stored_instead.clone(),
            inner: MemoryFavorites::new(),
        },
    );
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    let mut favorites = session.view().subscribe_favorites();
    wait_until(&mut favorites, Option::is_some).await;

    let requested = favorite(STATION, "1001472");
    session.add_favorite(requested.clone());
    wait_until(&mut favorites, |f| f.as_ref().is_some_and(|f| !f.is_empty())).await;

    let published = session.view().favorites().unwrap();
    assert_eq!(*published, h.favorites.list().await.unwrap());
    assert_eq!(*published, vec![stored_instead]);
    assert!(!published.contains(&requested));

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn lagging_session_skips_oldest_ticks() {
    let h = Harness::new();
    h.feed
        .push_batch(&station(), vec![arrival("3", "472", "120", "")]);

    let session = h.spawn(SessionConfig::default());
    wait_ready(session.view()).await;

    // The manual ticker buffers 64 ticks per subscriber
    for _ in 0..70 {
        h.ticker.fire(Tick::OneSecond);
    }
    wait_until(&mut session.view().subscribe_board(), |b| {
        first_status(b, RouteCategory::Trunk) == Some(EtaStatus::CountingDown(56))
    })
    .await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(
        first_status(&session.view().board(), RouteCategory::Trunk),
        Some(EtaStatus::CountingDown(56))
    );
    assert!(session.view().state().is_ready());
    assert_eq!(h.ticker.subscriber_count(), 1);

    session.shutdown().await;
}
