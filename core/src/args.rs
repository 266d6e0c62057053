//! Call arguments and the keys derived from them.
//!
//! Every endpoint call carries a set of named [`Args`]. They fill the URL
//! template, travel on every lifecycle action so observers can correlate
//! events with calls, and are mapped to a [`RequestKey`] by the endpoint's
//! optional [`KeyFn`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Named arguments of a single endpoint call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(BTreeMap<String, Value>);

impl Args {
    /// Empty argument set
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add an argument, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace an argument.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw value of an argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Stringified value of an argument, as it appears in a URL or key.
    ///
    /// Strings are used as-is, `null` counts as absent, anything else is
    /// rendered as JSON text (`42`, `true`).
    #[must_use]
    pub fn display(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Whether no arguments were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Identity under which an endpoint tracks one call and one state slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestKey(String);

impl RequestKey {
    /// Create a key from any string
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The constant key used by endpoints without a key function.
    #[must_use]
    pub const fn global() -> Self {
        Self(String::new())
    }

    /// Key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RequestKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Maps call arguments to a [`RequestKey`].
///
/// Endpoints with a key function are multiplexed: each key gets its own
/// in-flight call and its own state slot.
///
/// # Example
///
/// ```
/// use super_api_core::{Args, KeyFn, RequestKey};
///
/// let key_fn = KeyFn::args(&["planetId", "moonId"]);
/// let args = Args::new().with("planetId", 4).with("moonId", "phobos");
/// assert_eq!(key_fn.key(&args), RequestKey::new("4,phobos"));
/// ```
#[derive(Clone)]
pub struct KeyFn(Arc<dyn Fn(&Args) -> RequestKey + Send + Sync>);

impl KeyFn {
    /// Wrap an arbitrary key function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Args) -> RequestKey + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Key on the stringified value of one argument (empty when absent).
    #[must_use]
    pub fn arg(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(move |args| RequestKey::new(args.display(&name).unwrap_or_default()))
    }

    /// Key on several arguments joined with `,`.
    #[must_use]
    pub fn args(names: &[&str]) -> Self {
        let names: Vec<String> = names.iter().map(|n| (*n).to_string()).collect();
        Self::new(move |args| {
            let parts: Vec<String> = names
                .iter()
                .map(|n| args.display(n).unwrap_or_default())
                .collect();
            RequestKey::new(parts.join(","))
        })
    }

    /// Compute the key for a call.
    #[must_use]
    pub fn key(&self, args: &Args) -> RequestKey {
        (self.0)(args)
    }
}

impl fmt::Debug for KeyFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyFn(<fn>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_renders_scalars() {
        let args = Args::new()
            .with("name", "mars")
            .with("id", 42)
            .with("flag", true)
            .with("none", Value::Null);

        assert_eq!(args.display("name").as_deref(), Some("mars"));
        assert_eq!(args.display("id").as_deref(), Some("42"));
        assert_eq!(args.display("flag").as_deref(), Some("true"));
        assert_eq!(args.display("none"), None);
        assert_eq!(args.display("missing"), None);
    }

    #[test]
    fn test_single_arg_key() {
        let key_fn = KeyFn::arg("planetId");
        assert_eq!(key_fn.key(&Args::new().with("planetId", 42)), RequestKey::new("42"));
        assert_eq!(key_fn.key(&Args::new()), RequestKey::new(""));
    }

    #[test]
    fn test_custom_key() {
        let key_fn = KeyFn::new(|args| {
            RequestKey::new(format!("planet-{}", args.display("planetId").unwrap_or_default()))
        });
        assert_eq!(key_fn.key(&Args::new().with("planetId", 3)), RequestKey::new("planet-3"));
    }

    #[test]
    fn test_args_serialize_as_object() {
        let args: Args = [("b", json!(2)), ("a", json!("x"))].into_iter().collect();
        assert_eq!(serde_json::to_value(&args).ok(), Some(json!({"a": "x", "b": 2})));
    }
}
