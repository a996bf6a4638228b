//! Error types for the Canvas API client
//!
//! Every public API returns `Result<T, Error>`. Callers branch on
//! [`Error::kind`] (or the `status` / `is_rate_limited` helpers) instead of
//! matching on error text.

use thiserror::Error;

/// Marker Canvas puts in the body of a throttled (403) response
const RATE_LIMIT_MARKER: &str = "Rate Limit Exceeded";

/// The main error type for the Canvas API client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Request Building Errors
    // ============================================================================
    #[error("Cannot encode parameter '{key}': {message}")]
    Encode { key: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP {status} from {url}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
        /// Value of `X-Rate-Limit-Remaining` on the failed response
        rate_limit_remaining: Option<f64>,
        /// Value of `Retry-After` in seconds
        retry_after: Option<u64>,
    },

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("Failed to decode response as {shape} at '{path}': {message}")]
    Decode {
        shape: String,
        path: String,
        message: String,
    },

    #[error("Pagination error: {message}")]
    Pagination { message: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Page callback failed: {0}")]
    Callback(#[from] anyhow::Error),

    /// Wraps an error with the endpoint and 1-based page index it came from
    #[error("{endpoint} (page {page}): {source}")]
    Page {
        endpoint: String,
        page: usize,
        #[source]
        source: Box<Error>,
    },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure (connect, timeout, body read)
    Transport,
    /// Non-2xx response
    HttpStatus(u16),
    /// Body did not decode into the expected shape
    Decode,
    /// Cancellation observed on the progress handle
    Cancelled,
    /// A parameter could not be encoded
    Encode,
    /// Malformed or self-referential page cursor
    Pagination,
    /// Bad configuration or URL
    Config,
    /// The page callback returned an error
    Callback,
    /// Local filesystem failure
    Io,
    /// Anything else
    Other,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a parameter encoding error
    pub fn encode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error without rate-limit metadata
    pub fn http_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
            body: body.into(),
            rate_limit_remaining: None,
            retry_after: None,
        }
    }

    /// Create a decode error
    pub fn decode(
        shape: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Decode {
            shape: shape.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a pagination error
    pub fn pagination(message: impl Into<String>) -> Self {
        Self::Pagination {
            message: message.into(),
        }
    }

    /// Wrap an error with the endpoint and page it occurred on
    pub fn on_page(self, endpoint: impl Into<String>, page: usize) -> Self {
        Self::Page {
            endpoint: endpoint.into(),
            page,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through page context
    pub fn root(&self) -> &Error {
        match self {
            Error::Page { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self.root() {
            Error::Transport(_) | Error::Timeout { .. } => ErrorKind::Transport,
            Error::HttpStatus { status, .. } => ErrorKind::HttpStatus(*status),
            Error::Decode { .. } | Error::JsonParse(_) => ErrorKind::Decode,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Encode { .. } => ErrorKind::Encode,
            Error::Pagination { .. } => ErrorKind::Pagination,
            Error::Config { .. }
            | Error::MissingConfigField { .. }
            | Error::YamlParse(_)
            | Error::InvalidUrl(_) => ErrorKind::Config,
            Error::Callback(_) => ErrorKind::Callback,
            Error::Io(_) => ErrorKind::Io,
            Error::Other(_) | Error::Page { .. } => ErrorKind::Other,
        }
    }

    /// HTTP status code, if this is a status error
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Error::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided retry delay in seconds, if any
    pub fn retry_after(&self) -> Option<u64> {
        match self.root() {
            Error::HttpStatus { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Check if this error is the server throttling us.
    ///
    /// Canvas answers throttled requests with 403 and a "Rate Limit Exceeded"
    /// body; generic gateways use 429.
    pub fn is_rate_limited(&self) -> bool {
        match self.root() {
            Error::HttpStatus { status: 429, .. } => true,
            Error::HttpStatus {
                status: 403,
                body,
                rate_limit_remaining,
                ..
            } => {
                body.contains(RATE_LIMIT_MARKER)
                    || rate_limit_remaining.is_some_and(|remaining| remaining <= 0.0)
            }
            _ => false,
        }
    }

    /// Check if this error was caused by cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled)
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        if self.is_rate_limited() {
            return true;
        }
        match self.root() {
            Error::Transport(_) | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the Canvas API client
pub type Result<T> = std::result::Result<T, Error>;
