//! Execution engine module
//!
//! Runs one logical request to completion.
//!
//! # Overview
//!
//! [`Canvas::request`] drives the page loop:
//!
//! ```text
//! Fetching --2xx, decoded, callback ok--> Decoded --next link--> Fetching
//!     |                                      \--no next link--> Done
//!     \--transport/status/decode/callback error--> Failed
//! ```
//!
//! Cancellation is checked before every HTTP call. Pages are fetched one at a
//! time on the calling task; independent requests can run concurrently on a
//! cloned [`Canvas`].

mod types;

pub use types::Request;

use self::types::PageState;
use crate::config::CanvasConfig;
use crate::decode::decode_page;
use crate::endpoint::{Endpoint, Many, One, ResponseShape, Untyped};
use crate::error::{Error, Result};
use crate::http::{
    HttpClient, RawResponse, Transport, TransportRequest, RATE_LIMIT_REMAINING_HEADER,
};
use crate::pagination::{LinkHeaderPaginator, PageCursor, PaginationState, Paginator};
use crate::params::{encode_pairs, to_query_string, Params};
use crate::progress::Progress;
use crate::types::JsonObject;
use reqwest::header::RETRY_AFTER;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};
use url::Url;

/// Client for one Canvas instance
#[derive(Clone)]
pub struct Canvas {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    paginator: Box<dyn Paginator>,
    api_root: Url,
    max_pages: usize,
}

impl Canvas {
    /// Create a client backed by [`HttpClient`]
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::new(config)?;
        Self::with_transport(config, client)
    }

    /// Create a client for `https://<subdomain>.instructure.com`
    pub fn from_subdomain(subdomain: &str, token: impl Into<String>) -> Result<Self> {
        Self::new(&CanvasConfig::for_subdomain(subdomain, token))
    }

    /// Create a client over any transport
    pub fn with_transport(
        config: &CanvasConfig,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    /// Create a client over a transport shared with other clients
    pub fn with_shared_transport(
        config: &CanvasConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Inner {
                transport,
                paginator: Box::new(LinkHeaderPaginator::new(config.pagination.clone())),
                api_root: config.api_root()?,
                max_pages: config.max_pages,
            }),
        })
    }

    /// URL every endpoint is resolved against
    pub fn api_root(&self) -> &Url {
        &self.inner.api_root
    }

    /// Resolve a request into its first HTTP exchange.
    ///
    /// GET and DELETE carry parameters in the query string, appended to any
    /// query already in the endpoint; other verbs send a form body.
    pub fn prepare(&self, request: &Request) -> Result<TransportRequest> {
        let mut url = self
            .inner
            .api_root
            .join(request.endpoint.trim_start_matches('/'))?;

        if request.method.sends_body() {
            let body = to_query_string(&request.params)?;
            return Ok(TransportRequest::with_form(request.method, url, body));
        }

        let pairs = encode_pairs(&request.params)?;
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(&pairs);
        }
        Ok(TransportRequest {
            method: request.method,
            url,
            form_body: None,
        })
    }

    /// Run a request, decoding every page into `T` and handing it to
    /// `callback` in order.
    ///
    /// Returns after the last page, on the first error, or once `progress`
    /// is cancelled. Pages the callback already received stay with the
    /// caller. Errors carry the endpoint and 1-based page they occurred on.
    pub async fn request<T, F>(
        &self,
        request: &Request,
        progress: &Progress,
        mut callback: F,
    ) -> Result<()>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<()>,
    {
        let endpoint = request.endpoint.as_str();
        let first = self.prepare(request).map_err(|e| e.on_page(endpoint, 1))?;

        debug!("{} {}: starting", request.method, endpoint);
        let start = Instant::now();
        progress.add_work(1);

        let mut pagination = PaginationState::new(&first.url, self.inner.max_pages);
        let mut state = PageState::Fetching(first);
        loop {
            state = match state {
                PageState::Fetching(http_request) => {
                    match self
                        .fetch_page(http_request, &mut pagination, progress, &mut callback)
                        .await
                    {
                        Ok(next) => PageState::Decoded(next),
                        Err(e) => PageState::Failed(e),
                    }
                }
                PageState::Decoded(Some(cursor)) => match pagination.advance(cursor) {
                    Ok(url) => PageState::Fetching(TransportRequest::get(url)),
                    Err(e) => PageState::Failed(e),
                },
                PageState::Decoded(None) => PageState::Done,
                PageState::Done => {
                    debug!(
                        "{} {}: {} page(s) in {:?}",
                        request.method,
                        endpoint,
                        pagination.page,
                        start.elapsed()
                    );
                    return Ok(());
                }
                PageState::Failed(e) => {
                    debug!(
                        "{} {}: failed on page {}: {}",
                        request.method, endpoint, pagination.page, e
                    );
                    return Err(e.on_page(endpoint, pagination.page));
                }
            };
        }
    }

    async fn fetch_page<T, F>(
        &self,
        request: TransportRequest,
        pagination: &mut PaginationState,
        progress: &Progress,
        callback: &mut F,
    ) -> Result<Option<PageCursor>>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<()>,
    {
        if progress.is_cancelled() {
            return Err(Error::Cancelled);
        }

        trace!("Fetching page {}: {}", pagination.page, request.url);
        let response = self.inner.transport.execute(request, progress).await?;
        if !response.is_success() {
            return Err(status_error(&response));
        }

        let page: T = decode_page(&response.body)?;

        // Extra work is added before this page's unit is finished.
        let next = self.inner.paginator.next_page(&response);
        if !pagination.total_known {
            if let Some(total) = self.inner.paginator.total_pages(&response) {
                // Pages so far already account for `page` units.
                progress.add_work(total.saturating_sub(pagination.page as u64));
                pagination.total_known = true;
            }
        }
        if !pagination.total_known && matches!(next, Ok(Some(_))) {
            progress.add_work(1);
        }

        callback(page)?;
        progress.page_completed();
        next
    }

    /// GET `endpoint` with `params`, handing each page to `callback`
    pub async fn get<T, F>(
        &self,
        endpoint: &str,
        params: Params,
        progress: &Progress,
        callback: F,
    ) -> Result<()>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<()>,
    {
        let request = Request::get(endpoint).with_params(params);
        self.request(&request, progress, callback).await
    }

    /// Run a request and accumulate its pages according to `S`
    pub async fn fetch<S: ResponseShape>(
        &self,
        request: &Request,
        progress: &Progress,
    ) -> Result<S::Output> {
        let mut acc = None;
        self.request::<S::Page, _>(request, progress, |page| {
            acc = Some(S::accumulate(acc.take(), page));
            Ok(())
        })
        .await?;
        S::finish(acc)
    }

    /// Run a list request and collect every item across pages
    pub async fn fetch_all<T>(&self, request: &Request, progress: &Progress) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.fetch::<Many<T>>(request, progress).await
    }

    /// Run a request that returns a single object
    pub async fn fetch_one<T>(&self, request: &Request, progress: &Progress) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.fetch::<One<T>>(request, progress).await
    }

    /// Run a request and return the raw JSON object
    pub async fn fetch_map(&self, request: &Request, progress: &Progress) -> Result<JsonObject> {
        self.fetch::<Untyped>(request, progress).await
    }

    /// Run a declarative endpoint
    pub async fn send<E: Endpoint>(
        &self,
        endpoint: &E,
        progress: &Progress,
    ) -> Result<<E::Shape as ResponseShape>::Output> {
        let path = endpoint.path();
        let params = endpoint.params().map_err(|e| e.on_page(path.as_str(), 1))?;
        let request = Request::new(endpoint.method(), path).with_params(params);
        self.fetch::<E::Shape>(&request, progress).await
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("api_root", &self.inner.api_root.as_str())
            .field("max_pages", &self.inner.max_pages)
            .finish_non_exhaustive()
    }
}

/// Turn a non-2xx response into an error, keeping the rate-limit headers
fn status_error(response: &RawResponse) -> Error {
    let rate_limit_remaining = response
        .header(RATE_LIMIT_REMAINING_HEADER)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite());
    let retry_after = response
        .header(RETRY_AFTER.as_str())
        .and_then(|v| v.trim().parse::<u64>().ok());

    Error::HttpStatus {
        status: response.status,
        url: response.url.to_string(),
        body: response.text_lossy(),
        rate_limit_remaining,
        retry_after,
    }
}
