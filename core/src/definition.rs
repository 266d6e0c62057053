//! Declarative description of one endpoint.

use crate::action::{ActionFactory, EndpointId};
use crate::args::{Args, KeyFn, RequestKey};
use crate::options::DefaultOptions;
use crate::reducer::EndpointReducer;
use crate::url::UrlTemplate;

/// Everything needed to build an endpoint: name, URL template, optional key
/// function and per-verb default options.
///
/// The definition is pure data; the runtime turns it into a callable
/// endpoint and the reducer half is available via [`EndpointDefinition::reducer`].
///
/// # Example
///
/// ```
/// use super_api_core::{Args, EndpointDefinition, KeyFn, RequestKey};
///
/// let planets = EndpointDefinition::new("planets", "/api/planets/:planetId/")
///     .keyed_by(KeyFn::arg("planetId"));
///
/// let args = Args::new().with("planetId", 4);
/// assert_eq!(planets.url(&args), "/api/planets/4/");
/// assert_eq!(planets.key(&args), RequestKey::new("4"));
/// ```
#[derive(Debug, Clone)]
pub struct EndpointDefinition {
    id: EndpointId,
    template: UrlTemplate,
    key_fn: Option<KeyFn>,
    defaults: DefaultOptions,
}

impl EndpointDefinition {
    /// Single-slot endpoint in the default namespace.
    #[must_use]
    pub fn new(name: &str, url: impl Into<UrlTemplate>) -> Self {
        Self {
            id: EndpointId::new(name),
            template: url.into(),
            key_fn: None,
            defaults: DefaultOptions::default(),
        }
    }

    /// Multiplex calls and state by `key_fn`.
    #[must_use]
    pub fn keyed_by(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = Some(key_fn);
        self
    }

    /// Per-verb default options.
    #[must_use]
    pub fn with_defaults(mut self, defaults: DefaultOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Move the endpoint into another registry namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.id = EndpointId::with_namespace(namespace, self.id.name());
        self
    }

    /// Endpoint identity
    #[must_use]
    pub const fn id(&self) -> &EndpointId {
        &self.id
    }

    /// Endpoint name
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// URL template
    #[must_use]
    pub const fn template(&self) -> &UrlTemplate {
        &self.template
    }

    /// Key function, if the endpoint is multiplexed
    #[must_use]
    pub const fn key_fn(&self) -> Option<&KeyFn> {
        self.key_fn.as_ref()
    }

    /// Per-verb defaults
    #[must_use]
    pub const fn defaults(&self) -> &DefaultOptions {
        &self.defaults
    }

    /// Key for a call; the global key when the endpoint is not multiplexed.
    #[must_use]
    pub fn key(&self, args: &Args) -> RequestKey {
        self.key_fn
            .as_ref()
            .map_or_else(RequestKey::global, |key_fn| key_fn.key(args))
    }

    /// Concrete URL for a call.
    #[must_use]
    pub fn url(&self, args: &Args) -> String {
        self.template.resolve(args)
    }

    /// Action factory tagged with this endpoint.
    #[must_use]
    pub fn actions(&self) -> ActionFactory {
        ActionFactory::new(self.id.clone())
    }

    /// Reducer of this endpoint's state.
    #[must_use]
    pub fn reducer(&self) -> EndpointReducer {
        EndpointReducer::new(self.id.clone(), self.key_fn.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unkeyed_endpoint_uses_global_key() {
        let definition = EndpointDefinition::new("test", "/api/buckets/");
        assert_eq!(definition.key(&Args::new().with("x", 1)), RequestKey::global());
    }

    #[test]
    fn test_namespace_change_keeps_name() {
        let definition = EndpointDefinition::new("cart", "/cart/").in_namespace("@@shop");
        assert_eq!(definition.id().prefix(), "@@shop@cart");
        assert_eq!(definition.name(), "cart");
    }
}
