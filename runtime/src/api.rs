//! Endpoint registry.
//!
//! An [`Api`] groups endpoints that share a namespace, a transport, an event
//! sink and default options. Its [`ApiReducer`] drives one combined state,
//! usually held by a single [`Store`](crate::store::Store):
//!
//! ```ignore
//! let builder = Api::builder()
//!     .namespace("@@swapi")
//!     .endpoint(EndpointDefinition::new("people", "/api/people/"))
//!     .endpoint(
//!         EndpointDefinition::new("planets", "/api/planets/:planetId/")
//!             .keyed_by(KeyFn::arg("planetId")),
//!     );
//!
//! let store = Arc::new(Store::new(builder.reducer()?));
//! let api = builder.build(client, store.clone())?;
//!
//! api.endpoint("planets")?.get(Args::new().with("planetId", 1), RequestOptions::new()).await?;
//! ```

use crate::config::ApiConfig;
use crate::endpoint::Endpoint;
use crate::error::ConfigError;
use crate::http::HttpClient;
use crate::sink::EventSink;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use super_api_core::action::DEFAULT_NAMESPACE;
use super_api_core::{ApiReducer, ApiState, DefaultOptions, EndpointDefinition, Reducer};

/// Collects endpoint definitions and registry-wide settings.
#[derive(Debug, Clone)]
pub struct ApiBuilder {
    namespace: String,
    default_options: DefaultOptions,
    definitions: Vec<EndpointDefinition>,
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_options: DefaultOptions::default(),
            definitions: Vec::new(),
        }
    }
}

impl ApiBuilder {
    /// Empty registry in the default namespace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-filled from configuration.
    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        let mut builder = Self::new().default_options(config.default_options.clone());
        if let Some(namespace) = &config.namespace {
            builder = builder.namespace(namespace.clone());
        }
        config
            .definitions()
            .into_iter()
            .fold(builder, Self::endpoint)
    }

    /// Namespace of every endpoint's action types
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Defaults shared by all endpoints; endpoint defaults win over these
    #[must_use]
    pub fn default_options(mut self, defaults: DefaultOptions) -> Self {
        self.default_options = defaults;
        self
    }

    /// Register an endpoint
    #[must_use]
    pub fn endpoint(mut self, definition: EndpointDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Definitions as they will be built: validated, namespaced, defaults layered.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidName`] for an empty name or one containing `@`
    /// - [`ConfigError::DuplicateEndpoint`] when two endpoints share a name
    pub fn definitions(&self) -> Result<Vec<EndpointDefinition>, ConfigError> {
        let mut seen = BTreeSet::new();
        self.definitions
            .iter()
            .map(|definition| {
                let name = definition.name();
                if name.is_empty() || name.contains('@') {
                    return Err(ConfigError::InvalidName(name.to_string()));
                }
                if !seen.insert(name) {
                    return Err(ConfigError::DuplicateEndpoint(name.to_string()));
                }
                let defaults = definition.defaults().layered_over(&self.default_options);
                Ok(definition
                    .clone()
                    .in_namespace(&self.namespace)
                    .with_defaults(defaults))
            })
            .collect()
    }

    /// Reducer for the registry's combined state.
    ///
    /// Available before [`build`](Self::build) so a store can be created
    /// first and passed in as the sink.
    ///
    /// # Errors
    ///
    /// Same as [`definitions`](Self::definitions).
    pub fn reducer(&self) -> Result<ApiReducer, ConfigError> {
        Ok(ApiReducer::from_definitions(&self.definitions()?))
    }

    /// Build the registry.
    ///
    /// # Errors
    ///
    /// Same as [`definitions`](Self::definitions).
    pub fn build(
        self,
        client: Arc<dyn HttpClient>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Api, ConfigError> {
        let definitions = self.definitions()?;
        let reducer = ApiReducer::from_definitions(&definitions);
        let endpoints = definitions
            .into_iter()
            .map(|definition| {
                (
                    definition.name().to_string(),
                    Endpoint::new(definition, Arc::clone(&client), Arc::clone(&sink)),
                )
            })
            .collect();

        tracing::debug!(namespace = %self.namespace, count = reducer.len(), "Built endpoint registry");
        Ok(Api {
            namespace: self.namespace,
            endpoints,
            reducer,
        })
    }
}

/// A built endpoint registry.
#[derive(Debug, Clone)]
pub struct Api {
    namespace: String,
    endpoints: BTreeMap<String, Endpoint>,
    reducer: ApiReducer,
}

impl Api {
    /// Start a registry
    #[must_use]
    pub fn builder() -> ApiBuilder {
        ApiBuilder::new()
    }

    /// Build a registry straight from configuration.
    ///
    /// # Errors
    ///
    /// Same as [`ApiBuilder::build`].
    pub fn from_config(
        config: &ApiConfig,
        client: Arc<dyn HttpClient>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ConfigError> {
        ApiBuilder::from_config(config).build(client, sink)
    }

    /// Namespace of the registry's action types
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Endpoint by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    /// Endpoint by name, as an error when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEndpoint`] if no endpoint has that name.
    pub fn endpoint(&self, name: &str) -> Result<&Endpoint, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownEndpoint(name.to_string()))
    }

    /// All endpoints, in name order
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    /// Number of endpoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the registry has no endpoints
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Reducer for the combined state of all endpoints
    #[must_use]
    pub fn reducer(&self) -> ApiReducer {
        self.reducer.clone()
    }

    /// Combined state before any action
    #[must_use]
    pub fn initial_state(&self) -> ApiState {
        self.reducer.initial_state()
    }
}
