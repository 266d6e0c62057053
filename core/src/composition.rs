//! Reducer composition for a registry of endpoints.
//!
//! [`ApiReducer`] scopes each endpoint's reducer to its own slice of a shared
//! [`ApiState`], so one store can hold the state of every endpoint in a
//! registry. Actions are routed by the endpoint identity they carry; actions
//! from other namespaces are ignored.
//!
//! # Example
//!
//! ```
//! use super_api_core::{ApiReducer, Args, EndpointDefinition, Method, Reducer};
//!
//! let planets = EndpointDefinition::new("planets", "/api/planets/");
//! let moons = EndpointDefinition::new("moons", "/api/moons/");
//! let reducer = ApiReducer::from_definitions([&planets, &moons]);
//!
//! let state = reducer.fold(None, &planets.actions().request(Method::Get, Args::new()));
//! assert!(state.endpoint("planets").is_some());
//! assert!(state.endpoint("moons").is_some());
//! ```

use crate::action::{EndpointAction, EndpointId};
use crate::args::RequestKey;
use crate::definition::EndpointDefinition;
use crate::reducer::{EndpointReducer, Reducer};
use crate::state::{EndpointState, SyncLookup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Combined state of every endpoint in a registry, by endpoint name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiState(BTreeMap<String, EndpointState>);

impl ApiState {
    /// State slice of one endpoint
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<&EndpointState> {
        self.0.get(name)
    }

    /// Iterate over `(name, state)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EndpointState)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl SyncLookup for ApiState {
    fn is_synced(&self, endpoint: &EndpointId, key: &RequestKey) -> bool {
        self.endpoint(endpoint.name())
            .is_some_and(|state| state.is_synced(endpoint, key))
    }
}

/// Routes actions to per-endpoint reducers within one namespace.
#[derive(Debug, Clone, Default)]
pub struct ApiReducer {
    reducers: BTreeMap<String, EndpointReducer>,
    ids: BTreeMap<String, EndpointId>,
}

impl ApiReducer {
    /// Empty registry reducer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reducer over the given endpoint definitions.
    pub fn from_definitions<'a>(definitions: impl IntoIterator<Item = &'a EndpointDefinition>) -> Self {
        let mut reducer = Self::new();
        for definition in definitions {
            reducer.insert(definition);
        }
        reducer
    }

    /// Add one endpoint; replaces an endpoint of the same name.
    pub fn insert(&mut self, definition: &EndpointDefinition) {
        let name = definition.name().to_string();
        self.ids.insert(name.clone(), definition.id().clone());
        self.reducers.insert(name, definition.reducer());
    }

    /// Number of scoped endpoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether no endpoint is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl Reducer for ApiReducer {
    type State = ApiState;
    type Action = EndpointAction;

    fn initial_state(&self) -> ApiState {
        ApiState(
            self.reducers
                .iter()
                .map(|(name, reducer)| (name.clone(), reducer.initial_state()))
                .collect(),
        )
    }

    fn reduce(&self, state: &mut ApiState, action: &EndpointAction) {
        let name = action.endpoint.name();
        let (Some(reducer), Some(id)) = (self.reducers.get(name), self.ids.get(name)) else {
            return;
        };
        if id != &action.endpoint {
            return;
        }

        let slice = state
            .0
            .entry(name.to_string())
            .or_insert_with(|| reducer.initial_state());
        reducer.reduce(slice, action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{Args, KeyFn};
    use crate::method::Method;
    use crate::state::RequestState;
    use serde_json::json;

    fn registry() -> (EndpointDefinition, EndpointDefinition, ApiReducer) {
        let buckets = EndpointDefinition::new("buckets", "/api/buckets/");
        let planets = EndpointDefinition::new("planets", "/api/planets/:planetId/")
            .keyed_by(KeyFn::arg("planetId"));
        let reducer = ApiReducer::from_definitions([&buckets, &planets]);
        (buckets, planets, reducer)
    }

    #[test]
    fn test_initial_state_has_every_endpoint() {
        let (_, _, reducer) = registry();
        let state = reducer.initial_state();
        assert_eq!(state.endpoint("buckets"), Some(&EndpointState::Single(RequestState::default())));
        assert_eq!(state.endpoint("planets"), Some(&EndpointState::Keyed(BTreeMap::new())));
    }

    #[test]
    fn test_routes_to_named_slice_only() {
        let (buckets, _, reducer) = registry();
        let mut state = reducer.initial_state();
        reducer.reduce(&mut state, &buckets.actions().success(json!([1]), 200, Args::new()));

        let Some(EndpointState::Single(slot)) = state.endpoint("buckets") else {
            unreachable!("buckets is single-slot");
        };
        assert!(slot.sync);
        assert_eq!(state.endpoint("planets"), Some(&EndpointState::Keyed(BTreeMap::new())));
    }

    #[test]
    fn test_ignores_other_namespace() {
        let (_, _, reducer) = registry();
        let stranger = EndpointDefinition::new("buckets", "/x/").in_namespace("@@other");
        let state = reducer.fold(None, &stranger.actions().request(Method::Get, Args::new()));
        assert_eq!(state, reducer.initial_state());
    }

    #[test]
    fn test_sync_lookup_is_scoped_by_endpoint() {
        let (_, planets, reducer) = registry();
        let args = Args::new().with("planetId", 3);
        let state = reducer.fold(None, &planets.actions().success(json!({}), 200, args.clone()));

        assert!(state.is_synced(planets.id(), &planets.key(&args)));
        assert!(!state.is_synced(&EndpointId::new("buckets"), &planets.key(&args)));
    }
}
