//! Client configuration
//!
//! A [`CanvasConfig`] is built in code with [`CanvasConfig::builder`] or
//! loaded from a YAML/JSON file:
//!
//! ```yaml
//! subdomain: myschool          # or base_url: https://canvas.example.edu
//! token_file: myschool.pri     # or token: "...", defaults to <subdomain>.pri
//! timeout_secs: 60
//! max_pages: 500
//! rate_limit:
//!   requests_per_second: 5
//!   burst_size: 5
//! archive_dir: ./raw
//! ```

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{QuotaConfig, RateLimiterConfig};
use crate::pagination::PaginationConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "CANVAS_BASE_URL";

/// Environment variable overriding the API token
pub const ENV_TOKEN: &str = "CANVAS_TOKEN";

/// Extension of per-instance token files
const TOKEN_FILE_EXTENSION: &str = "pri";

/// Root URL of a hosted Canvas instance
pub fn instance_url(subdomain: &str) -> String {
    format!("https://{subdomain}.instructure.com")
}

// ============================================================================
// Runtime Config
// ============================================================================

/// Configuration for a [`Canvas`](crate::Canvas) client
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Instance root, e.g. `https://myschool.instructure.com`
    pub base_url: String,
    /// API path prefix joined onto `base_url`
    pub api_prefix: String,
    /// Credential sent to the Canvas host
    pub auth: AuthConfig,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Extra headers for every request
    pub default_headers: HashMap<String, String>,
    /// Redirects followed per request
    pub max_redirects: usize,
    /// Pages fetched per logical request before giving up
    pub max_pages: usize,
    /// Client-side throttle, off by default
    pub rate_limit: Option<RateLimiterConfig>,
    /// Server quota tracking, on by default
    pub quota: Option<QuotaConfig>,
    /// Directory to mirror response bodies into
    pub archive_dir: Option<PathBuf>,
    /// Where next-page links are found
    pub pagination: PaginationConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_prefix: "/api/v1/".to_string(),
            auth: AuthConfig::None,
            timeout: Duration::from_secs(30),
            user_agent: format!("canvas-api/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
            max_redirects: 10,
            max_pages: 10_000,
            rate_limit: None,
            quota: Some(QuotaConfig::default()),
            archive_dir: None,
            pagination: PaginationConfig::default(),
        }
    }
}

impl CanvasConfig {
    /// Create a new config builder
    pub fn builder() -> CanvasConfigBuilder {
        CanvasConfigBuilder::default()
    }

    /// Config for a hosted instance with a bearer token
    pub fn for_subdomain(subdomain: &str, token: impl Into<String>) -> Self {
        Self::builder().subdomain(subdomain).token(token).build()
    }

    /// Absolute URL every endpoint path is resolved against.
    ///
    /// Always ends with `/` so relative endpoints append rather than replace.
    pub fn api_root(&self) -> Result<Url> {
        if self.base_url.trim().is_empty() {
            return Err(Error::missing_field("base_url"));
        }
        let mut base = Url::parse(self.base_url.trim())?;
        if base.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base_url '{}' cannot be used as a base",
                self.base_url
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            return Ok(base);
        }
        Ok(base.join(&format!("{prefix}/"))?)
    }

    /// Parse a YAML config; relative token files resolve against the
    /// working directory
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        file.into_config(Path::new("."))
    }

    /// Parse a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json)?;
        file.into_config(Path::new("."))
    }

    /// Load a YAML or JSON config file (by extension); relative token files
    /// resolve against the file's directory
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let file: ConfigFile = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        debug!("Loaded config from {}", path.display());
        file.into_config(dir)
    }

    /// Apply `CANVAS_BASE_URL` / `CANVAS_TOKEN` from the environment
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.auth = AuthConfig::bearer(token.trim());
        }
        self
    }

    /// Check the config can build a client
    pub fn validate(&self) -> Result<()> {
        self.api_root()?;
        if self.max_pages == 0 {
            return Err(Error::config("max_pages must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be non-zero"));
        }
        Ok(())
    }
}

/// Builder for [`CanvasConfig`]
#[derive(Debug, Default)]
pub struct CanvasConfigBuilder {
    config: CanvasConfig,
}

impl CanvasConfigBuilder {
    /// Set the instance root URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Target `https://<subdomain>.instructure.com`
    pub fn subdomain(mut self, subdomain: &str) -> Self {
        self.config.base_url = instance_url(subdomain);
        self
    }

    /// Set the API path prefix
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.api_prefix = prefix.into();
        self
    }

    /// Authenticate with a bearer token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.auth = AuthConfig::bearer(token);
        self
    }

    /// Set the credential
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the redirect limit
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the page limit per request
    pub fn max_pages(mut self, max: usize) -> Self {
        self.config.max_pages = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Set quota tracking parameters
    pub fn quota(mut self, config: QuotaConfig) -> Self {
        self.config.quota = Some(config);
        self
    }

    /// Disable quota tracking
    pub fn no_quota(mut self) -> Self {
        self.config.quota = None;
        self
    }

    /// Mirror response bodies under `dir`
    pub fn archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.archive_dir = Some(dir.into());
        self
    }

    /// Set pagination link settings
    pub fn pagination(mut self, config: PaginationConfig) -> Self {
        self.config.pagination = config;
        self
    }

    /// Build the config
    pub fn build(self) -> CanvasConfig {
        self.config
    }
}

// ============================================================================
// File Format
// ============================================================================

/// On-disk configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    subdomain: Option<String>,

    #[serde(default)]
    base_url: Option<String>,

    #[serde(default)]
    api_prefix: Option<String>,

    #[serde(default)]
    token: Option<String>,

    #[serde(default)]
    token_file: Option<PathBuf>,

    #[serde(default)]
    auth: Option<AuthConfig>,

    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,

    #[serde(default)]
    user_agent: Option<String>,

    #[serde(default)]
    headers: HashMap<String, String>,

    #[serde(default = "default_max_redirects")]
    max_redirects: usize,

    #[serde(default = "default_max_pages")]
    max_pages: usize,

    #[serde(default)]
    rate_limit: Option<RateLimiterConfig>,

    #[serde(default = "default_true")]
    track_quota: bool,

    #[serde(default)]
    quota: QuotaConfig,

    #[serde(default)]
    archive_dir: Option<PathBuf>,

    #[serde(default)]
    pagination: PaginationConfig,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_redirects() -> usize {
    10
}

fn default_max_pages() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}

impl ConfigFile {
    fn into_config(self, dir: &Path) -> Result<CanvasConfig> {
        let base_url = match (&self.base_url, &self.subdomain) {
            (Some(url), _) => url.clone(),
            (None, Some(subdomain)) => instance_url(subdomain),
            (None, None) => return Err(Error::missing_field("base_url or subdomain")),
        };
        let auth = self.resolve_auth(dir)?;

        let defaults = CanvasConfig::default();
        Ok(CanvasConfig {
            base_url,
            api_prefix: self.api_prefix.unwrap_or(defaults.api_prefix),
            auth,
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            default_headers: self.headers,
            max_redirects: self.max_redirects,
            max_pages: self.max_pages,
            rate_limit: self.rate_limit,
            quota: self.track_quota.then_some(self.quota),
            archive_dir: self.archive_dir.map(|d| resolve(dir, &d)),
            pagination: self.pagination,
        })
    }

    /// Credential precedence: `auth`, `token`, `token_file`, then
    /// `<subdomain>.pri` when it exists
    fn resolve_auth(&self, dir: &Path) -> Result<AuthConfig> {
        if let Some(auth) = &self.auth {
            return Ok(auth.clone());
        }
        if let Some(token) = &self.token {
            return Ok(AuthConfig::bearer(token.trim()));
        }
        if let Some(file) = &self.token_file {
            return read_token(&resolve(dir, file)).map(AuthConfig::bearer);
        }
        if let Some(subdomain) = &self.subdomain {
            let file = dir.join(format!("{subdomain}.{TOKEN_FILE_EXTENSION}"));
            if file.is_file() {
                return read_token(&file).map(AuthConfig::bearer);
            }
        }
        warn!("No Canvas token configured; requests will be unauthenticated");
        Ok(AuthConfig::None)
    }
}

fn resolve(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

fn read_token(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("cannot read token file {}: {e}", path.display()))
    })?;
    let token = contents.trim();
    if token.is_empty() {
        return Err(Error::config(format!(
            "token file {} is empty",
            path.display()
        )));
    }
    Ok(token.to_string())
}
