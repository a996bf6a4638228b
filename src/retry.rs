//! Caller-side retries
//!
//! The engine never retries: a failed page ends the logical request and the
//! accumulator has already seen the earlier pages. Callers whose accumulator
//! can start over (e.g. one that collects into a fresh `Vec` per attempt) wrap
//! the whole request in [`with_retry`].

use crate::error::{Error, Result};
use crate::progress::Progress;
use crate::types::BackoffType;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// When and how long to wait before re-running a request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff strategy
    pub backoff_type: BackoffType,
    /// Delay before the first retry, in milliseconds
    pub initial_backoff_ms: u64,
    /// Upper bound on computed delays, in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_type: BackoffType::Exponential,
            initial_backoff_ms: 500,
            max_backoff_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Set max retries
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.backoff_type = backoff_type;
        self.initial_backoff_ms = duration_ms(initial);
        self.max_backoff_ms = duration_ms(max);
        self
    }

    /// Calculate backoff delay for a given attempt (0-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let initial = Duration::from_millis(self.initial_backoff_ms);
        let delay = match self.backoff_type {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => initial.saturating_mul(2u32.saturating_pow(attempt)),
        };

        std::cmp::min(delay, Duration::from_millis(self.max_backoff_ms))
    }

    /// Delay before retrying after `error`; a server `Retry-After` wins
    pub fn delay_for(&self, attempt: u32, error: &Error) -> Duration {
        match error.retry_after() {
            Some(secs) => Duration::from_secs(secs),
            None => self.calculate_backoff(attempt),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retries run out. `op` receives the 0-based attempt number.
///
/// Cancellation on `progress` stops the loop, including during a backoff
/// sleep.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    progress: &Progress,
    mut op: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        let error = match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if attempt >= policy.max_retries || !error.is_retryable() || progress.is_cancelled() {
            return Err(error);
        }

        let delay = policy.delay_for(attempt, &error);
        warn!(
            "{}; attempt {}/{}, retrying in {:?}",
            error,
            attempt + 1,
            policy.max_retries + 1,
            delay
        );
        tokio::select! {
            biased;
            () = progress.cancelled() => return Err(Error::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
