//! Client-side throttle
//!
//! An optional token bucket (governor) in front of every request, on top of
//! the server quota in [`super::quota`]. Waiting for a token honours
//! cancellation.

use crate::error::{Error, Result};
use crate::progress::Progress;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use serde::Deserialize;
use std::num::NonZeroU32;
use tracing::trace;

/// Throttle settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimiterConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed back to back before throttling starts
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 10,
        }
    }
}

impl RateLimiterConfig {
    /// Create a throttle config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket shared by every request of one client
pub struct RateLimiter {
    limiter: Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
}

impl RateLimiter {
    /// Create a throttle; zero rates fall back to one
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Governor::direct(quota),
        }
    }

    /// Wait for a token, or fail with [`Error::Cancelled`]
    pub async fn acquire(&self, progress: &Progress) -> Result<()> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }
        trace!("Throttled, waiting for a token");
        tokio::select! {
            biased;
            () = progress.cancelled() => Err(Error::Cancelled),
            () = self.limiter.until_ready() => Ok(()),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
