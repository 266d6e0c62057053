//! Client and registry configuration.
//!
//! [`ClientConfig`] configures the HTTP transport. [`ApiConfig`] describes a
//! whole endpoint registry as data and can be loaded from JSON:
//!
//! ```json
//! {
//!   "namespace": "@@swapi",
//!   "default_options": { "get": { "headers": { "accept": "application/json" } } },
//!   "endpoints": {
//!     "planets": { "url": "/api/planets/:planetId/", "key_args": ["planetId"] },
//!     "people":  { "url": "/api/people/" }
//!   }
//! }
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use super_api_core::{DefaultOptions, EndpointDefinition, KeyFn};

/// Environment variable holding the base URL
pub const BASE_URL_ENV: &str = "SUPER_API_BASE_URL";
/// Environment variable holding the timeout in milliseconds
pub const TIMEOUT_ENV: &str = "SUPER_API_TIMEOUT_MS";

/// HTTP transport configuration.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use super_api_runtime::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_base_url("https://swapi.dev")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.base_url.as_deref(), Some("https://swapi.dev"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL relative endpoint URLs are joined onto
    pub base_url: Option<String>,
    /// Timeout applied to calls without their own
    pub timeout: Option<Duration>,
    /// `User-Agent` header
    pub user_agent: String,
}

impl ClientConfig {
    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the default timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Defaults overridden by `SUPER_API_BASE_URL` and `SUPER_API_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the timeout is not a whole number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.is_empty()) {
            config.base_url = Some(base_url);
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV).filter(|v| !v.is_empty()) {
            let millis: u64 = timeout
                .trim()
                .parse()
                .map_err(|_| ConfigError::Parse(format!("{TIMEOUT_ENV}={timeout:?}")))?;
            config.timeout = Some(Duration::from_millis(millis));
        }
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: None,
            user_agent: concat!("super-api/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// One endpoint of an [`ApiConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL template
    pub url: String,

    /// Arguments the call key is built from; empty for a single-slot endpoint
    #[serde(default)]
    pub key_args: Vec<String>,

    /// Per-verb defaults, layered over the registry's
    #[serde(default)]
    pub default_options: DefaultOptions,
}

impl EndpointConfig {
    /// Definition named `name`
    #[must_use]
    pub fn definition(&self, name: &str) -> EndpointDefinition {
        let definition = EndpointDefinition::new(name, self.url.as_str())
            .with_defaults(self.default_options.clone());
        match self.key_args.as_slice() {
            [] => definition,
            [single] => definition.keyed_by(KeyFn::arg(single.as_str())),
            many => {
                let names: Vec<&str> = many.iter().map(String::as_str).collect();
                definition.keyed_by(KeyFn::args(&names))
            },
        }
    }
}

/// Endpoint registry described as data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Namespace of the registry's action types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Defaults shared by all endpoints
    #[serde(default)]
    pub default_options: DefaultOptions,

    /// Endpoints by name
    #[serde(default)]
    pub endpoints: BTreeMap<String, EndpointConfig>,
}

impl ApiConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Definitions of all endpoints, in name order.
    ///
    /// Registry-level namespace and defaults are applied by
    /// [`ApiBuilder`](crate::api::ApiBuilder).
    #[must_use]
    pub fn definitions(&self) -> Vec<EndpointDefinition> {
        self.endpoints
            .iter()
            .map(|(name, endpoint)| endpoint.definition(name))
            .collect()
    }
}
