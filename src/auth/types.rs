//! Auth configuration types

use serde::Deserialize;
use std::collections::HashMap;

/// Authentication configuration.
///
/// Every credential travels in a header, so request URLs (and the errors,
/// logs and archive paths built from them) never contain a secret.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Bearer token authentication (Canvas access tokens)
    Bearer {
        /// The bearer token
        token: String,
    },

    /// API key sent in a header
    ApiKey {
        /// Header name, `Authorization` when unset
        #[serde(default)]
        header_name: Option<String>,
        /// The API key value
        value: String,
    },

    /// Custom headers
    CustomHeaders {
        /// Headers to add to each request
        headers: HashMap<String, String>,
    },
}

impl AuthConfig {
    /// Bearer auth with the given token
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Check if any credential is configured
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bearer { .. } => f.debug_struct("Bearer").field("token", &"***").finish(),
            Self::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("header_name", header_name)
                .field("value", &"***")
                .finish(),
            Self::CustomHeaders { headers } => {
                let mut names: Vec<&String> = headers.keys().collect();
                names.sort();
                f.debug_struct("CustomHeaders")
                    .field("headers", &names)
                    .finish()
            }
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        let config = AuthConfig::default();
        assert!(config.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = AuthConfig::bearer("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_auth_config_deserialize() {
        let config: AuthConfig =
            serde_json::from_str(r#"{"type": "bearer", "token": "abc"}"#).unwrap();
        assert_eq!(config, AuthConfig::bearer("abc"));

        let config: AuthConfig = serde_json::from_str(
            r#"{"type": "api_key", "header_name": "X-API-Key", "value": "k"}"#,
        )
        .unwrap();
        assert!(matches!(
            config,
            AuthConfig::ApiKey { header_name: Some(ref name), .. } if name == "X-API-Key"
        ));
    }

    #[test]
    fn test_query_placement_is_rejected() {
        let result = serde_json::from_str::<AuthConfig>(
            r#"{"type": "api_key", "location": "query", "query_param": "access_token", "value": "k"}"#,
        );
        assert!(result.is_err());
    }
}
