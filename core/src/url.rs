//! URL templates with `:name` placeholders.

use crate::args::Args;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parameterized URL such as `/api/planets/:planetId/moons/:moonId/`.
///
/// Resolution is pure and total:
///
/// 1. each `:name` placeholder with a matching argument is replaced by the
///    argument's stringified value (a placeholder only matches its whole
///    identifier, so `:id` never matches inside `:identifier`);
/// 2. placeholders without an argument are removed together with their
///    leading `/`;
/// 3. runs of `/` in the path collapse into one. A `scheme://` prefix is left
///    alone.
///
/// # Example
///
/// ```
/// use super_api_core::{Args, UrlTemplate};
///
/// let template = UrlTemplate::new("/api/buckets/:bucketId/");
/// assert_eq!(template.resolve(&Args::new().with("bucketId", 42)), "/api/buckets/42/");
/// assert_eq!(template.resolve(&Args::new()), "/api/buckets/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Wrap a template string.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// The raw template
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Names of all placeholders, in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.0.as_str();
        while let Some(pos) = rest.find(':') {
            let tail = &rest[pos + 1..];
            let len = placeholder_len(tail);
            if len > 0 {
                names.push(&tail[..len]);
            }
            rest = &tail[len..];
        }
        names
    }

    /// Substitute `args` into the template.
    #[must_use]
    pub fn resolve(&self, args: &Args) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();

        while let Some(pos) = rest.find(':') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos + 1..];
            let len = placeholder_len(tail);

            if len == 0 {
                // Not a placeholder (`https://`, `host:8080`)
                out.push(':');
            } else if let Some(value) = args.display(&tail[..len]) {
                out.push_str(&value);
            } else if out.ends_with('/') {
                out.pop();
            }

            rest = &tail[len..];
        }
        out.push_str(rest);

        collapse_separators(&out)
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UrlTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

/// Length of the identifier at the start of `s`, 0 if `s` does not start one.
fn placeholder_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(s.len(), |(i, _)| i)
}

fn collapse_separators(url: &str) -> String {
    let (scheme, path) = match url.find("://") {
        Some(idx) => url.split_at(idx + 3),
        None => ("", url),
    };

    let mut out = String::with_capacity(url.len());
    out.push_str(scheme);
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' && previous_slash {
            continue;
        }
        previous_slash = c == '/';
        out.push(c);
    }
    out
}
