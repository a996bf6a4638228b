//! Pagination module
//!
//! Canvas paginates with an RFC 5988 `Link` header:
//!
//! ```text
//! Link: <https://x.instructure.com/api/v1/courses?page=2&per_page=10>; rel="next",
//!       <https://x.instructure.com/api/v1/courses?page=1&per_page=10>; rel="first",
//!       <https://x.instructure.com/api/v1/courses?page=5&per_page=10>; rel="last"
//! ```
//!
//! The header name and the followed rel come from [`PaginationConfig`].

mod link;
mod strategies;
mod types;

pub use link::{last_page_number, Link, LinkHeader};
pub use strategies::LinkHeaderPaginator;
pub use types::{PageCursor, PaginationConfig, PaginationState, Paginator};
