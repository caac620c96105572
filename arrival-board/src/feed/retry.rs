//! Retry policy for feed calls.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How often a failed fetch is re-issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; `None` retries until success.
    pub max_attempts: Option<u32>,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Retry until the call succeeds.
    pub fn unlimited(backoff: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff,
        }
    }

    /// Give up after `max_attempts` calls (at least one call is always made).
    pub fn bounded(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            backoff,
        }
    }

    /// Make a single attempt.
    pub fn none() -> Self {
        Self::bounded(1, Duration::ZERO)
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unlimited(Duration::from_secs(2))
    }
}

/// Run `op` until it succeeds or the policy gives up.
///
/// The last error is returned once attempts are exhausted.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if policy.exhausted(attempts) => {
                warn!(attempts, error = %e, "giving up after repeated failures");
                return Err(e);
            }
            Err(e) => {
                warn!(attempts, error = %e, "fetch failed, retrying");
                tokio::time::sleep(policy.backoff).await;
            }
        }
    }
}
