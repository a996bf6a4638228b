//! Server quota tracking
//!
//! Canvas reports the caller's remaining request budget in
//! `X-Rate-Limit-Remaining`. The budget regenerates at a steady rate, and every
//! in-flight request is charged a fixed pre-flight cost. Before sending, the
//! client waits until the estimated budget covers that cost, which keeps it
//! clear of 403 "Rate Limit Exceeded" responses.

use crate::error::{Error, Result};
use crate::progress::Progress;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Header carrying the remaining quota
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-rate-limit-remaining";

/// Quota model parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Bucket capacity
    pub max: f64,
    /// Units regenerated per second
    pub regen_per_second: f64,
    /// Cost charged to each in-flight request
    pub preflight_cost: f64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max: 700.0,
            regen_per_second: 10.0,
            preflight_cost: 50.0,
        }
    }
}

#[derive(Debug)]
struct Observation {
    remaining: f64,
    at: Instant,
}

/// Shared estimate of the server-side request budget
#[derive(Debug)]
pub struct QuotaTracker {
    config: QuotaConfig,
    last: Mutex<Option<Observation>>,
    pending: Arc<AtomicUsize>,
    gate: tokio::sync::Mutex<()>,
}

/// Marks a request as in flight until dropped
#[derive(Debug)]
pub struct QuotaPermit {
    pending: Arc<AtomicUsize>,
}

impl Drop for QuotaPermit {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

impl QuotaTracker {
    /// Create a tracker with no observations yet
    pub fn new(config: QuotaConfig) -> Self {
        Self {
            config,
            last: Mutex::new(None),
            pending: Arc::new(AtomicUsize::new(0)),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Record the quota reported by a response, if present
    pub fn observe(&self, headers: &HeaderMap) {
        let Some(remaining) = headers
            .get(RATE_LIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
        else {
            return;
        };
        let remaining = remaining.clamp(0.0, self.config.max);

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(Observation {
            remaining,
            at: Instant::now(),
        });
    }

    /// Last value reported by the server
    pub fn last_reported(&self) -> Option<f64> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|o| o.remaining)
    }

    /// Requests currently holding a permit
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Estimated budget available to a new request
    pub fn available(&self) -> f64 {
        let regenerated = match self
            .last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(obs) => {
                obs.remaining + self.config.regen_per_second * obs.at.elapsed().as_secs_f64()
            }
            None => self.config.max,
        };
        if regenerated >= self.config.max {
            return self.config.max;
        }
        regenerated - self.config.preflight_cost * self.pending() as f64
    }

    /// How long to wait before the budget covers one more request
    pub fn wait_time(&self) -> Option<Duration> {
        let available = self.available();
        if available >= self.config.preflight_cost || self.config.regen_per_second <= 0.0 {
            return None;
        }
        let secs = (self.config.preflight_cost - available) / self.config.regen_per_second;
        let max_wait = self.config.max / self.config.regen_per_second;
        Duration::try_from_secs_f64(secs.min(max_wait)).ok()
    }

    /// Wait for budget, then mark a request in flight.
    ///
    /// Waiters are served one at a time; cancellation aborts the wait.
    pub async fn acquire(&self, progress: &Progress) -> Result<QuotaPermit> {
        let _gate = self.gate.lock().await;
        while let Some(delay) = self.wait_time() {
            debug!(
                "Quota low ({:.1} available), waiting {:?}",
                self.available(),
                delay
            );
            tokio::select! {
                biased;
                () = progress.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
        self.pending.fetch_add(1, Ordering::SeqCst);
        Ok(QuotaPermit {
            pending: Arc::clone(&self.pending),
        })
    }
}
