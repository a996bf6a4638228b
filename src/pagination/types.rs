//! Pagination types and traits

use crate::error::{Error, Result};
use crate::http::RawResponse;
use serde::Deserialize;
use std::collections::HashSet;
use url::Url;

/// Opaque pointer to the next page: the absolute URL to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(Url);

impl PageCursor {
    /// Wrap a resolved URL
    pub fn new(url: Url) -> Self {
        Self(url)
    }

    /// The URL this cursor points at
    pub fn url(&self) -> &Url {
        &self.0
    }

    /// Consume the cursor
    pub fn into_url(self) -> Url {
        self.0
    }
}

/// Where to find the next-page link
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Response header carrying links
    pub header: String,
    /// Relation to follow for the next page
    pub rel: String,
    /// Relation pointing at the final page, used for progress estimates
    pub last_rel: String,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            header: "link".to_string(),
            rel: "next".to_string(),
            last_rel: "last".to_string(),
        }
    }
}

/// Tracks one logical request across pages.
///
/// Refuses to revisit a URL and caps the number of pages so a malformed or
/// self-referential cursor cannot loop forever.
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// 1-based index of the page being fetched
    pub page: usize,
    /// Upper bound on pages for this request
    pub max_pages: usize,
    /// Whether the total page count is already known
    pub total_known: bool,
    visited: HashSet<String>,
}

impl PaginationState {
    /// Start at page 1 with the given first URL
    pub fn new(first: &Url, max_pages: usize) -> Self {
        let mut visited = HashSet::new();
        visited.insert(first.as_str().to_string());
        Self {
            page: 1,
            max_pages: max_pages.max(1),
            total_known: false,
            visited,
        }
    }

    /// Move to the page a cursor points at
    pub fn advance(&mut self, cursor: PageCursor) -> Result<Url> {
        if self.page >= self.max_pages {
            return Err(Error::pagination(format!(
                "exceeded {} pages, stopping at {}",
                self.max_pages,
                cursor.url()
            )));
        }
        if !self.visited.insert(cursor.url().as_str().to_string()) {
            return Err(Error::pagination(format!(
                "next link {} was already fetched",
                cursor.url()
            )));
        }
        self.page += 1;
        Ok(cursor.into_url())
    }

    /// Number of distinct URLs fetched or scheduled
    pub fn visited(&self) -> usize {
        self.visited.len()
    }
}

/// Extracts page cursors from responses
pub trait Paginator: Send + Sync {
    /// Cursor for the page after `response`, if any
    fn next_page(&self, response: &RawResponse) -> Result<Option<PageCursor>>;

    /// Total number of pages, when the response advertises it
    fn total_pages(&self, response: &RawResponse) -> Option<u64>;
}
