//! Live arrival boards in the terminal.
//!
//! ```text
//! arrival-board <STOP_NUMBER>...       follow one board per stop until Ctrl-C
//! arrival-board vehicle <VEHICLE_ID>   look up where a bus is right now
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use arrival_board::board::Activity;
use arrival_board::catalog::{CachedCatalog, CatalogCacheConfig, FileCatalog};
use arrival_board::domain::StationId;
use arrival_board::favorites::FileFavoritesStore;
use arrival_board::feed::{FeedClient, FeedClientConfig, RetryPolicy, fetch_vehicle_position};
use arrival_board::session::{
    BoardSnapshot, IntervalTicker, SessionConfig, SessionSources, SessionView, StationSession,
    TickerConfig,
};

const DEFAULT_STATIONS_FILE: &str = "data/stations.json";
const DEFAULT_FAVORITES_FILE: &str = "data/favorites.json";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: arrival-board <STOP_NUMBER>...");
        eprintln!("       arrival-board vehicle <VEHICLE_ID>");
        std::process::exit(2);
    }

    let Some(service_key) = service_key_from_env() else {
        error!("SEOUL_BUS_API_KEY is not set; get a service key from the open data portal");
        std::process::exit(2);
    };
    let client = FeedClient::new(FeedClientConfig::new(service_key))?;

    match args.as_slice() {
        [command, vehicle_id] if command == "vehicle" => show_vehicle(&client, vehicle_id).await,
        stops => follow_boards(client, stops).await,
    }
}

async fn show_vehicle(client: &FeedClient, vehicle_id: &str) -> Result<(), BoxError> {
    let policy = RetryPolicy::bounded(5, Duration::from_secs(2));
    match fetch_vehicle_position(client, vehicle_id, &policy).await? {
        Some(position) => info!(
            vehicle_id,
            plate = %position.plate_number,
            last_stop = %position.last_stop_id,
            reported_at = %position.data_time,
            "vehicle position"
        ),
        None => info!(vehicle_id, "no position reported for vehicle"),
    }
    Ok(())
}

async fn follow_boards(client: FeedClient, stops: &[String]) -> Result<(), BoxError> {
    let stations = stops
        .iter()
        .map(|s| StationId::parse(s))
        .collect::<Result<Vec<_>, _>>()?;

    let stations_file = env_or("STATIONS_FILE", DEFAULT_STATIONS_FILE);
    let favorites_file = env_or("FAVORITES_FILE", DEFAULT_FAVORITES_FILE);
    info!(%stations_file, %favorites_file, "loading catalog and favorites");

    let catalog = CachedCatalog::new(FileCatalog::new(stations_file), &CatalogCacheConfig::default());
    let sources = SessionSources::new(
        Arc::new(client),
        Arc::new(catalog),
        Arc::new(FileFavoritesStore::new(favorites_file)),
    );
    let ticker = IntervalTicker::start(TickerConfig::default());

    let sessions: Vec<StationSession> = stations
        .into_iter()
        .map(|station| {
            let session =
                StationSession::spawn(station, sources.clone(), &ticker, SessionConfig::default());
            tokio::spawn(log_updates(
                session.station_id().clone(),
                session.view().clone(),
            ));
            session
        })
        .collect();
    info!(sessions = sessions.len(), "following arrival boards, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    join_all(sessions.into_iter().map(StationSession::shutdown)).await;
    Ok(())
}

/// The API service key, if one is configured.
fn service_key_from_env() -> Option<String> {
    usable_service_key(std::env::var("SEOUL_BUS_API_KEY").ok())
}

/// Blank keys count as missing.
fn usable_service_key(raw: Option<String>) -> Option<String> {
    raw.map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Log each refreshed board and each error until the session stops.
async fn log_updates(station: StationId, view: SessionView) {
    let mut board = view.subscribe_board();
    let mut errors = view.subscribe_errors();
    let mut loaded = view.subscribe_loaded();
    let mut last_refresh = None;

    loop {
        tokio::select! {
            changed = board.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = Arc::clone(&board.borrow_and_update());
                // Countdown steps are too chatty for info
                if snapshot.refreshed_at != last_refresh {
                    last_refresh = snapshot.refreshed_at;
                    log_board(&station, &snapshot);
                }
            }
            changed = errors.changed() => {
                if changed.is_err() {
                    break;
                }
                let err = errors.borrow_and_update().clone();
                if let Some(err) = err {
                    warn!(%station, error = %err, "board error");
                }
            }
            Ok(()) = loaded.changed() => {
                if *loaded.borrow_and_update() {
                    let name = view.station().map(|s| s.name).unwrap_or_default();
                    let favorites = view.favorites().map(|f| f.len()).unwrap_or(0);
                    info!(%station, %name, favorites, "board ready");
                }
            }
        }
    }
    debug!(%station, "stopped following board");
}

fn log_board(station: &StationId, board: &BoardSnapshot) {
    let classification = &board.classification;
    info!(
        %station,
        next_station = board.next_station.as_deref().unwrap_or(""),
        active = classification.active().values().map(|g| g.len()).sum::<usize>(),
        inactive = classification.inactive().values().map(|g| g.len()).sum::<usize>(),
        "board refreshed"
    );

    for (key, group) in classification.sections() {
        for record in group {
            match key.activity {
                Activity::Active => info!(
                    %station,
                    category = %key.category,
                    route = %record.route_number,
                    first = %record.first.status,
                    second = %record.second.status,
                    stops_away = ?record.first.position.as_ref().and_then(|p| p.stops_away()),
                    "arrival"
                ),
                Activity::Inactive => debug!(
                    %station,
                    category = %key.category,
                    route = %record.route_number,
                    "no arrival information"
                ),
            }
        }
    }
}
