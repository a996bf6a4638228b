//! Pagination strategy implementations

use super::link::{last_page_number, LinkHeader};
use super::types::{PageCursor, PaginationConfig, Paginator};
use crate::error::{Error, Result};
use crate::http::RawResponse;

// ============================================================================
// Link Header Pagination
// ============================================================================

/// Link header pagination (RFC 5988)
///
/// Follows the configured rel (default `next`). Relative links are resolved
/// against the URL of the response they came from.
#[derive(Debug, Clone, Default)]
pub struct LinkHeaderPaginator {
    config: PaginationConfig,
}

impl LinkHeaderPaginator {
    /// Create a paginator from config
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    fn links(&self, response: &RawResponse) -> Option<LinkHeader> {
        // A response may repeat the header; entries are merged.
        let values: Vec<&str> = response
            .headers
            .get_all(self.config.header.as_str())
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(LinkHeader::parse(&values.join(",")))
    }
}

impl Paginator for LinkHeaderPaginator {
    fn next_page(&self, response: &RawResponse) -> Result<Option<PageCursor>> {
        let Some(links) = self.links(response) else {
            return Ok(None);
        };
        let Some(next) = links.get(&self.config.rel) else {
            return Ok(None);
        };
        let url = response.url.join(next).map_err(|e| {
            Error::pagination(format!("malformed {} link '{next}': {e}", self.config.rel))
        })?;
        Ok(Some(PageCursor::new(url)))
    }

    fn total_pages(&self, response: &RawResponse) -> Option<u64> {
        let links = self.links(response)?;
        let last = links.get(&self.config.last_rel)?;
        let url = response.url.join(last).ok()?;
        last_page_number(&url)
    }
}
