//! Busy-retry policy for store operations.
//!
//! `SQLite` answers concurrent writers with `SQLITE_BUSY`/`SQLITE_LOCKED`.
//! [`RetryPolicy::run`] re-executes an operation that failed that way,
//! sleeping `backoff + jitter` between attempts and doubling `backoff` each
//! time. Any other failure is returned untouched on the first attempt.
//!
//! # Delay Calculation
//!
//! ```text
//! delay(n) = base_backoff * 2^(n-1) + uniform(0..=max_jitter)
//! ```
//!
//! With defaults the waits are roughly 100ms, 200ms, 400ms, 800ms before the
//! fifth and last attempt.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::StoreError;

/// Default attempt ceiling, including the initial attempt.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default wait before the second attempt.
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(100);

/// Default upper bound of the random jitter added to every wait.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(100);

/// Retry configuration for lock contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_backoff: Duration, max_jitter: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
            max_jitter,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `op` until it succeeds, fails with a non-contention error, or the
    /// attempt ceiling is reached.
    ///
    /// Cancellation is observed only while waiting between attempts.
    ///
    /// # Errors
    ///
    /// - the operation's own error when it is not busy/locked
    /// - [`StoreError::Cancelled`] if `cancel` fires during a wait
    /// - [`StoreError::RetriesExhausted`] when every attempt was busy/locked
    #[instrument(skip_all, fields(max_attempts = self.max_attempts))]
    pub async fn run<T, E, F, Fut>(
        &self,
        cancel: &CancellationToken,
        mut op: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<StoreError>,
    {
        let mut backoff = self.base_backoff;
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let error: StoreError = match op().await {
                Ok(value) => return Ok(value),
                Err(error) => error.into(),
            };

            if !error.is_busy_or_locked() {
                return Err(error);
            }
            last_error = error.to_string();

            if attempt == self.max_attempts {
                break;
            }

            let delay = backoff + self.jitter();
            debug!(
                attempt,
                delay_ms = delay.as_millis(),
                error = %last_error,
                "database busy, backing off"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(attempt, "store retry cancelled");
                    return Err(StoreError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }

            backoff = backoff.saturating_mul(2);
        }

        warn!(
            attempts = self.max_attempts,
            error = %last_error,
            "database still busy, giving up"
        );
        Err(StoreError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}
