//! Scripted arrival feed for testing without API access.
//!
//! Responses are queued per station and served in order. The last queued
//! response is repeated once the queue drains, so periodic refreshes keep
//! seeing the most recent state.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::domain::StationId;

use super::error::FeedError;
use super::source::ArrivalSource;
use super::types::RawArrivalRecord;

#[derive(Debug, Clone)]
enum Scripted {
    Batch(Vec<RawArrivalRecord>),
    Failure(String),
}

#[derive(Debug, Clone)]
struct MockResponse {
    delay: Duration,
    outcome: Scripted,
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<StationId, VecDeque<MockResponse>>,
    calls: usize,
}

/// Mock arrival source that serves scripted batches.
#[derive(Debug, Clone, Default)]
pub struct MockArrivalFeed {
    state: Arc<Mutex<MockState>>,
}

impl MockArrivalFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch for `station`.
    pub fn push_batch(&self, station: &StationId, records: Vec<RawArrivalRecord>) {
        self.push(station, Duration::ZERO, Scripted::Batch(records));
    }

    /// Queue a batch that is only delivered after `delay`.
    pub fn push_delayed_batch(
        &self,
        station: &StationId,
        delay: Duration,
        records: Vec<RawArrivalRecord>,
    ) {
        self.push(station, delay, Scripted::Batch(records));
    }

    /// Queue a transport failure for `station`.
    pub fn push_failure(&self, station: &StationId, message: impl Into<String>) {
        self.push(station, Duration::ZERO, Scripted::Failure(message.into()));
    }

    /// Number of fetches served so far, across all stations.
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    fn push(&self, station: &StationId, delay: Duration, outcome: Scripted) {
        self.lock()
            .responses
            .entry(station.clone())
            .or_default()
            .push_back(MockResponse { delay, outcome });
    }

    fn next_response(&self, station: &StationId) -> Option<MockResponse> {
        let mut state = self.lock();
        state.calls += 1;
        let queue = state.responses.get_mut(station)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArrivalSource for MockArrivalFeed {
    async fn fetch_arrivals(&self, station: &StationId) -> Result<Vec<RawArrivalRecord>, FeedError> {
        let response = self.next_response(station).ok_or_else(|| FeedError::Status {
            status: 404,
            message: format!("no mock data for station {station}"),
        })?;

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        match response.outcome {
            Scripted::Batch(records) => Ok(records),
            Scripted::Failure(message) => Err(FeedError::Status {
                status: 503,
                message,
            }),
        }
    }
}
