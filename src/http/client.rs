//! reqwest-backed transport
//!
//! Handles, per request:
//! - Credentials, only for the Canvas host
//! - Client-side throttling and server quota waits
//! - Redirects, timeouts and cancellation
//! - Archiving successful bodies

use super::archive::ResponseArchive;
use super::quota::QuotaTracker;
use super::rate_limit::RateLimiter;
use super::transport::{RawResponse, Transport, TransportRequest};
use crate::auth::Authenticator;
use crate::config::CanvasConfig;
use crate::error::{Error, Result};
use crate::progress::Progress;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{redirect, Client};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use url::{Origin, Url};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP client for one Canvas instance
pub struct HttpClient {
    client: Client,
    canvas_origin: Origin,
    timeout: Duration,
    default_headers: HeaderMap,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
    quota: Option<Arc<QuotaTracker>>,
    archive: Option<ResponseArchive>,
}

impl HttpClient {
    /// Create a client from config
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        let api_root = config.api_root()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (key, value) in &config.default_headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name '{key}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header '{key}': {e}")))?;
            default_headers.insert(name, value);
        }

        if config.auth.is_none() {
            warn!("No credential configured for {}", api_root.origin().ascii_serialization());
        }

        Ok(Self {
            client,
            canvas_origin: api_root.origin(),
            timeout: config.timeout,
            default_headers,
            authenticator: Authenticator::new(config.auth.clone()),
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
            quota: config
                .quota
                .clone()
                .map(|quota| Arc::new(QuotaTracker::new(quota))),
            archive: config.archive_dir.as_ref().map(ResponseArchive::new),
        })
    }

    /// Quota tracker shared by every request on this client
    pub fn quota(&self) -> Option<&QuotaTracker> {
        self.quota.as_deref()
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Check whether `url` belongs to the configured Canvas instance
    pub fn is_canvas_host(&self, url: &Url) -> bool {
        url.origin() == self.canvas_origin
    }

    async fn throttle(&self, progress: &Progress) -> Result<()> {
        match &self.rate_limiter {
            Some(limiter) => limiter.acquire(progress).await,
            None => Ok(()),
        }
    }

    fn build(&self, request: TransportRequest) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(request.method.into(), request.url.clone())
            .headers(self.default_headers.clone());

        if let Some(body) = request.form_body {
            req = req.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        if self.is_canvas_host(&request.url) {
            self.authenticator.apply(req)
        } else {
            debug!(
                "Withholding credentials from foreign host {}",
                request.url.host_str().unwrap_or_default()
            );
            req
        }
    }

    fn map_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            #[allow(clippy::cast_possible_truncation)]
            return Error::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            };
        }
        Error::Transport(error)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn execute(&self, request: TransportRequest, progress: &Progress) -> Result<RawResponse> {
        if progress.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.throttle(progress).await?;
        let _permit = match &self.quota {
            Some(quota) => Some(quota.acquire(progress).await?),
            None => None,
        };

        let method = request.method;
        let req = self.build(request);
        let start = Instant::now();

        let exchange = async {
            let response = req.send().await?;
            let url = response.url().clone();
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse {
                url,
                status,
                headers,
                body,
            })
        };

        let response = tokio::select! {
            biased;
            () = progress.cancelled() => return Err(Error::Cancelled),
            result = exchange => result.map_err(|e| self.map_error(e))?,
        };

        debug!(
            "{} {} -> {} ({} bytes, {:?})",
            method,
            response.url,
            response.status,
            response.body.len(),
            start.elapsed()
        );

        if let Some(quota) = &self.quota {
            quota.observe(&response.headers);
        }

        if response.is_success() && self.is_canvas_host(&response.url) {
            if let Some(archive) = &self.archive {
                archive.save(&response.url, &response.body).await?;
            }
        } else if !response.is_success() {
            trace!("Error body from {}: {}", response.url, response.text_lossy());
        }

        Ok(response)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("canvas_origin", &self.canvas_origin)
            .field("timeout", &self.timeout)
            .field("authenticator", &self.authenticator)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .field("has_quota", &self.quota.is_some())
            .field("archive", &self.archive)
            .finish_non_exhaustive()
    }
}
