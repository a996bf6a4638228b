//! HTTP transport module
//!
//! One request in, one raw response out. Status classification, decoding and
//! pagination happen in the engine; this layer only moves bytes.
//!
//! # Features
//!
//! - **Transport trait**: the seam the engine talks to, so tests and callers
//!   can substitute their own implementation
//! - **Host-scoped credentials**: the token is only sent to the Canvas host
//! - **Rate Limiting**: optional token bucket throttle using governor
//! - **Quota tracking**: waits out a low `X-Rate-Limit-Remaining` budget
//! - **Archive**: optionally mirrors response bodies to disk

mod archive;
mod client;
mod quota;
mod rate_limit;
mod transport;

pub use archive::ResponseArchive;
pub use client::HttpClient;
pub use quota::{QuotaConfig, QuotaPermit, QuotaTracker, RATE_LIMIT_REMAINING_HEADER};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{RawResponse, Transport, TransportRequest};

#[cfg(test)]
mod tests;
