//! Authentication module
//!
//! Supports: Bearer token, API key header, custom headers.
//!
//! Credentials are scoped to the Canvas host: the HTTP client only asks the
//! `Authenticator` to sign requests whose host matches the configured base
//! URL, so tokens never leak to file-download redirects or third-party links.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::AuthConfig;
