//! Per-call transport options and their per-verb defaults.

use crate::method::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Options handed to the transport with a call.
///
/// Header names are compared case-insensitively: builders and
/// deserialization store them lowercase, and merging lowercases both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Extra request headers
    #[serde(default, deserialize_with = "lowercase_names")]
    pub headers: BTreeMap<String, String>,

    /// Query string parameters
    #[serde(default)]
    pub query: BTreeMap<String, String>,

    /// Per-call timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Base URL that relative endpoint URLs are joined onto
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl RequestOptions {
    /// No options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Timeout as a [`Duration`]
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Layer `self` over `defaults`; values set on `self` win.
    #[must_use]
    pub fn merged_over(&self, defaults: &Self) -> Self {
        let mut merged = defaults.clone();
        merged.headers = defaults
            .headers
            .iter()
            .chain(&self.headers)
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect();
        merged
            .query
            .extend(self.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        if self.timeout_ms.is_some() {
            merged.timeout_ms = self.timeout_ms;
        }
        if self.base_url.is_some() {
            merged.base_url.clone_from(&self.base_url);
        }
        merged
    }
}

fn lowercase_names<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let headers = BTreeMap::<String, String>::deserialize(deserializer)?;
    Ok(headers
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect())
}

/// Default [`RequestOptions`] per HTTP verb.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultOptions(BTreeMap<Method, RequestOptions>);

impl DefaultOptions {
    /// No defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the defaults for one verb, builder style.
    #[must_use]
    pub fn with(mut self, method: Method, options: RequestOptions) -> Self {
        self.0.insert(method, options);
        self
    }

    /// Set the same defaults for every verb.
    #[must_use]
    pub fn for_all(options: &RequestOptions) -> Self {
        Self(Method::ALL.into_iter().map(|m| (m, options.clone())).collect())
    }

    /// Defaults for `method`, empty when none were configured.
    #[must_use]
    pub fn get(&self, method: Method) -> RequestOptions {
        self.0.get(&method).cloned().unwrap_or_default()
    }

    /// Layer `self` over `base`, verb by verb.
    #[must_use]
    pub fn layered_over(&self, base: &Self) -> Self {
        let mut layered = base.clone();
        for (method, options) in &self.0 {
            let merged = options.merged_over(&base.get(*method));
            layered.0.insert(*method, merged);
        }
        layered
    }

    /// Effective options for a call: caller options over the verb's defaults.
    #[must_use]
    pub fn resolve(&self, method: Method, caller: &RequestOptions) -> RequestOptions {
        caller.merged_over(&self.get(method))
    }
}
