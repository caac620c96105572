//! Tick sources for the countdown and refresh cadences.
//!
//! Sessions subscribe to a broadcast channel of [`Tick`]s instead of
//! registering with a global timer; dropping the receiver unsubscribes.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::trace;

/// A periodic event delivered to every subscribed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tick {
    /// Advance local countdowns by one second.
    OneSecond,
    /// Re-fetch arrivals from the network.
    ThirtySeconds,
}

/// Something sessions can subscribe to for ticks.
pub trait TickSource {
    fn subscribe(&self) -> broadcast::Receiver<Tick>;
}

/// Configuration for [`IntervalTicker`].
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Period of [`Tick::OneSecond`].
    pub countdown_period: Duration,
    /// Period of [`Tick::ThirtySeconds`].
    pub refresh_period: Duration,
    /// Broadcast buffer per subscriber.
    ///
    /// A session that falls more than this many ticks behind skips the
    /// oldest ones. Skipped [`Tick::OneSecond`]s are not replayed, so its
    /// countdown runs that many seconds slow until the next refresh resets
    /// it from the feed.
    pub capacity: usize,
}

impl TickerConfig {
    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn with_countdown_period(mut self, period: Duration) -> Self {
        self.countdown_period = period;
        self
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            countdown_period: Duration::from_secs(1),
            refresh_period: Duration::from_secs(30),
            capacity: 16,
        }
    }
}

/// Tick source driven by tokio intervals.
///
/// The background task stops when the ticker is dropped.
pub struct IntervalTicker {
    sender: broadcast::Sender<Tick>,
    handle: JoinHandle<()>,
}

impl IntervalTicker {
    /// Start ticking. Must be called from within a tokio runtime.
    pub fn start(config: TickerConfig) -> Self {
        let (sender, _) = broadcast::channel(config.capacity.max(1));
        let tx = sender.clone();

        let handle = tokio::spawn(async move {
            let mut countdown = tokio::time::interval(config.countdown_period);
            let mut refresh = tokio::time::interval(config.refresh_period);
            // First tick is immediate, skip it
            countdown.tick().await;
            refresh.tick().await;

            loop {
                let tick = tokio::select! {
                    _ = countdown.tick() => Tick::OneSecond,
                    _ = refresh.tick() => Tick::ThirtySeconds,
                };
                // No subscribers is fine; sessions come and go
                let receivers = tx.send(tick).unwrap_or(0);
                trace!(?tick, receivers, "tick");
            }
        });

        Self { sender, handle }
    }

    /// Number of sessions currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl TickSource for IntervalTicker {
    fn subscribe(&self) -> broadcast::Receiver<Tick> {
        self.sender.subscribe()
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Tick source fired by hand, for tests and embedding in other event loops.
#[derive(Debug, Clone)]
pub struct ManualTicker {
    sender: broadcast::Sender<Tick>,
}

impl ManualTicker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Deliver `tick` to every subscriber; returns how many received it.
    pub fn fire(&self, tick: Tick) -> usize {
        self.sender.send(tick).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ManualTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for ManualTicker {
    fn subscribe(&self) -> broadcast::Receiver<Tick> {
        self.sender.subscribe()
    }
}
