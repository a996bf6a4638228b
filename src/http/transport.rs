//! Transport abstraction
//!
//! One authenticated HTTP exchange for a fully resolved URL. The engine only
//! talks to this trait, so any implementation (the reqwest-backed
//! [`HttpClient`](super::HttpClient), a recording fake, a cache) can sit
//! underneath it.

use crate::error::Result;
use crate::progress::Progress;
use crate::types::Method;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use url::Url;

/// A fully resolved request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL, query string included
    pub url: Url,
    /// Form-encoded body for mutating verbs
    pub form_body: Option<String>,
}

impl TransportRequest {
    /// Create a GET request
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            form_body: None,
        }
    }

    /// Create a request with a form body
    pub fn with_form(method: Method, url: Url, form_body: String) -> Self {
        Self {
            method,
            url,
            form_body: Some(form_body),
        }
    }
}

/// Raw response as received from the server, whatever its status
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
}

impl RawResponse {
    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issues one HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request.
    ///
    /// Implementations must return [`Error::Cancelled`](crate::Error::Cancelled)
    /// instead of completing when `progress` is cancelled, and must return
    /// non-2xx responses as `Ok` so the caller can classify them.
    async fn execute(&self, request: TransportRequest, progress: &Progress) -> Result<RawResponse>;
}
