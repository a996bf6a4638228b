//! Engine types
//!
//! The request descriptor and the per-request pagination state machine.

use crate::error::Error;
use crate::http::TransportRequest;
use crate::pagination::PageCursor;
use crate::params::{Params, ToParam};
use crate::types::Method;

/// One logical API call: method, endpoint and parameters.
///
/// The engine only borrows a `Request`, so it is never modified while pages
/// are being fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API root, e.g. `courses/1/modules`
    pub endpoint: String,
    /// Parameters; query string for GET/DELETE, form body otherwise
    pub params: Params,
}

impl Request {
    /// Create a request
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Params::new(),
        }
    }

    /// Create a GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// Create a POST request
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    /// Create a PUT request
    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    /// Create a PATCH request
    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    /// Create a DELETE request
    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Replace the parameters
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Add one parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToParam) -> Self {
        self.params.insert(key, value);
        self
    }
}

/// Where a logical request is in its page loop
#[derive(Debug)]
pub(crate) enum PageState {
    /// About to issue this request
    Fetching(TransportRequest),
    /// A page was handed to the callback; holds the next cursor, if any
    Decoded(Option<PageCursor>),
    /// No more pages
    Done,
    /// Stopped on this error
    Failed(Error),
}
