// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # canvas-api
//!
//! A generic fetch-and-paginate engine for the Canvas LMS REST API.
//!
//! One primitive, [`Canvas::request`], handles every endpoint: it encodes
//! parameters Rails-style, sends the request with the instance token, decodes
//! each page into the caller's type, follows `Link: <...>; rel="next"` headers
//! and reports progress, stopping on the first error or on cancellation.
//!
//! ## Features
//!
//! - **Typed responses**: any `serde::Deserialize` type, or untyped JSON maps
//! - **Pagination**: Link header following with loop and page-count guards
//! - **Progress & cancellation**: shared [`Progress`] handles with listeners
//! - **Rate limits**: server quota tracking and an optional client throttle
//! - **Declarative endpoints**: describe calls with the [`Endpoint`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use canvas_api::{Canvas, CanvasConfig, Progress, Request, Result};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Module {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = CanvasConfig::from_file("canvas.yaml")?.with_env();
//!     let canvas = Canvas::new(&config)?;
//!
//!     let progress = Progress::new();
//!     progress.on_update(|s| eprintln!("{:.0}%", s.fraction * 100.0));
//!
//!     let request = Request::get("courses/1/modules").param("per_page", 50);
//!     let modules: Vec<Module> = canvas.fetch_all(&request, &progress).await?;
//!     for module in modules {
//!         println!("{} {}", module.id, module.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │        Canvas::request / fetch_all / fetch_one / send        │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────┬──────────────┬───┴──────────┬──────────┬──────────┐
//! │  Params  │  Transport   │    Decode    │ Paginate │ Progress │
//! ├──────────┼──────────────┼──────────────┼──────────┼──────────┤
//! │ key[]    │ Bearer auth  │ serde types  │ Link     │ Work     │
//! │ key[sub] │ Quota, Retry │ Error paths  │ Loop cap │ Cancel   │
//! │ Dates    │ Archive      │ ListPage     │          │          │
//! └──────────┴──────────────┴──────────────┴──────────┴──────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: document error variant fields before 1.0

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Rails-style parameter encoding
pub mod params;

/// Authentication implementations
pub mod auth;

/// HTTP transport with quota tracking and rate limiting
pub mod http;

/// Response decoding
pub mod decode;

/// Link header pagination
pub mod pagination;

/// Progress reporting and cancellation
pub mod progress;

/// Response shapes and declarative endpoints
pub mod endpoint;

/// Main execution engine
pub mod engine;

/// Client configuration
pub mod config;

/// Caller-side retries
pub mod retry;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorKind, Result};
pub use types::*;

// Re-export commonly used types
pub use config::CanvasConfig;
pub use endpoint::{Endpoint, Many, One, ResponseShape};
pub use engine::{Canvas, Request};
pub use params::{ApiEnum, ParamValue, Params, ToParam};
pub use progress::{Progress, ProgressSnapshot};
pub use retry::{with_retry, RetryPolicy};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
