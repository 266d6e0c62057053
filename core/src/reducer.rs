//! Reducers - the pure fold from lifecycle actions to request state.
//!
//! Reducers are pure functions: `(State, Action) → State`. They never perform
//! I/O, which keeps the state machine deterministic and testable in isolation
//! from any transport.
//!
//! Three reducers cover the two endpoint modes:
//!
//! - [`RequestReducer`]: one global slot
//! - [`KeyedReducer`]: one slot per [`RequestKey`](crate::RequestKey)
//! - [`EndpointReducer`]: either of the above, chosen by the endpoint definition

use crate::action::{ActionKind, EndpointAction, EndpointId};
use crate::args::KeyFn;
use crate::state::{EndpointState, KeyedState, RequestState};

/// The Reducer trait - core abstraction for state transitions
///
/// # Example
///
/// ```
/// use super_api_core::{ActionFactory, Args, EndpointId, Reducer, RequestReducer};
///
/// let id = EndpointId::new("test");
/// let reducer = RequestReducer::new(id.clone());
/// let mut state = reducer.initial_state();
/// reducer.reduce(&mut state, &ActionFactory::new(id).reset(Args::new()));
/// assert!(!state.loading);
/// ```
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// State before any action has been reduced.
    fn initial_state(&self) -> Self::State;

    /// Apply one action to `state` in place.
    ///
    /// Actions that do not concern this reducer leave `state` untouched.
    fn reduce(&self, state: &mut Self::State, action: &Self::Action);

    /// Functional form: `reduce(prior | undefined, action) → next`.
    ///
    /// A missing prior state starts from [`Reducer::initial_state`].
    fn fold(&self, prior: Option<Self::State>, action: &Self::Action) -> Self::State {
        let mut state = prior.unwrap_or_else(|| self.initial_state());
        self.reduce(&mut state, action);
        state
    }
}

/// Reducer of a single-slot endpoint.
#[derive(Debug, Clone)]
pub struct RequestReducer {
    endpoint: EndpointId,
}

impl RequestReducer {
    /// Reducer for `endpoint`
    #[must_use]
    pub const fn new(endpoint: EndpointId) -> Self {
        Self { endpoint }
    }
}

impl Reducer for RequestReducer {
    type State = RequestState;
    type Action = EndpointAction;

    fn initial_state(&self) -> RequestState {
        RequestState::default()
    }

    fn reduce(&self, state: &mut RequestState, action: &EndpointAction) {
        if action.is_from(&self.endpoint) {
            state.apply(&action.kind);
        }
    }
}

/// Reducer of a multiplexed endpoint.
///
/// Foreign actions are rejected before the map is touched, so a keyed
/// reducer can share a store with unrelated endpoints. Only the slot of the
/// action's key changes; every other slot is left as it was.
#[derive(Debug, Clone)]
pub struct KeyedReducer {
    endpoint: EndpointId,
    key_fn: KeyFn,
}

impl KeyedReducer {
    /// Reducer for `endpoint`, keyed by `key_fn`
    #[must_use]
    pub const fn new(endpoint: EndpointId, key_fn: KeyFn) -> Self {
        Self { endpoint, key_fn }
    }
}

impl Reducer for KeyedReducer {
    type State = KeyedState;
    type Action = EndpointAction;

    fn initial_state(&self) -> KeyedState {
        KeyedState::new()
    }

    fn reduce(&self, state: &mut KeyedState, action: &EndpointAction) {
        if !action.is_from(&self.endpoint) {
            return;
        }

        let key = self.key_fn.key(&action.args);
        match &action.kind {
            ActionKind::Reset => {
                state.insert(key, RequestState::default());
            },
            kind => state.entry(key).or_default().apply(kind),
        }
    }
}

/// Reducer of one endpoint in whichever mode its definition selects.
#[derive(Debug, Clone)]
pub enum EndpointReducer {
    /// One global slot
    Single(RequestReducer),
    /// One slot per key
    Keyed(KeyedReducer),
}

impl EndpointReducer {
    /// Reducer for `endpoint`; keyed when `key_fn` is present.
    #[must_use]
    pub fn new(endpoint: EndpointId, key_fn: Option<KeyFn>) -> Self {
        match key_fn {
            Some(key_fn) => Self::Keyed(KeyedReducer::new(endpoint, key_fn)),
            None => Self::Single(RequestReducer::new(endpoint)),
        }
    }
}

impl Reducer for EndpointReducer {
    type State = EndpointState;
    type Action = EndpointAction;

    fn initial_state(&self) -> EndpointState {
        match self {
            Self::Single(reducer) => EndpointState::Single(reducer.initial_state()),
            Self::Keyed(reducer) => EndpointState::Keyed(reducer.initial_state()),
        }
    }

    fn reduce(&self, state: &mut EndpointState, action: &EndpointAction) {
        match (self, state) {
            (Self::Single(reducer), EndpointState::Single(slot)) => reducer.reduce(slot, action),
            (Self::Keyed(reducer), EndpointState::Keyed(slots)) => reducer.reduce(slots, action),
            (_, state) => {
                // State built for the other mode; start over in ours
                *state = self.initial_state();
                self.reduce(state, action);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionFactory, ErrorInfo};
    use crate::args::{Args, RequestKey};
    use crate::method::Method;
    use serde_json::json;

    fn planet() -> (KeyedReducer, ActionFactory) {
        let id = EndpointId::new("planet");
        (
            KeyedReducer::new(id.clone(), KeyFn::arg("planetId")),
            ActionFactory::new(id),
        )
    }

    fn moon() -> (KeyedReducer, ActionFactory) {
        let id = EndpointId::new("moon");
        (
            KeyedReducer::new(id.clone(), KeyFn::args(&["planetId", "moonId"])),
            ActionFactory::new(id),
        )
    }

    #[test]
    fn test_single_default_on_unrecognized_action() {
        let reducer = RequestReducer::new(EndpointId::new("test"));
        let foreign = ActionFactory::new(EndpointId::new("other")).request(Method::Get, Args::new());
        assert_eq!(reducer.fold(None, &foreign), RequestState::default());
    }

    #[test]
    fn test_single_request_from_undefined_state() {
        let id = EndpointId::new("test");
        let reducer = RequestReducer::new(id.clone());
        let state = reducer.fold(None, &ActionFactory::new(id).request(Method::Get, Args::new()));
        assert!(state.loading && state.syncing && !state.sync);
    }

    #[test]
    fn test_single_ignores_foreign_actions() {
        let id = EndpointId::new("test");
        let reducer = RequestReducer::new(id);
        let prior = RequestState {
            sync: true,
            data: json!({"sample": 42}),
            ..RequestState::default()
        };
        let foreign = ActionFactory::new(EndpointId::new("other")).reset(Args::new());
        assert_eq!(reducer.fold(Some(prior.clone()), &foreign), prior);
    }

    #[test]
    fn test_keyed_empty_by_default() {
        let (reducer, _) = planet();
        assert!(reducer.initial_state().is_empty());
    }

    #[test]
    fn test_keyed_rejects_foreign_prefix_on_first_call() {
        let (_, planet_actions) = planet();
        let (moon_reducer, _) = moon();
        let action = planet_actions.reset(Args::new().with("planetId", 42));
        assert!(moon_reducer.fold(None, &action).is_empty());
    }

    #[test]
    fn test_keyed_reset_seeds_default_slot() {
        let (reducer, actions) = planet();
        let state = reducer.fold(None, &actions.reset(Args::new().with("planetId", 42)));

        assert_eq!(state.len(), 1);
        assert_eq!(state.get(&RequestKey::new("42")), Some(&RequestState::default()));
    }

    #[test]
    fn test_keyed_slots_are_independent() {
        let (reducer, actions) = planet();
        let a = Args::new().with("planetId", "A");
        let b = Args::new().with("planetId", "B");

        let mut state = reducer.initial_state();
        reducer.reduce(&mut state, &actions.request(Method::Get, a.clone()));
        reducer.reduce(&mut state, &actions.success(json!({"name": "a"}), 200, a));
        reducer.reduce(&mut state, &actions.request(Method::Get, b.clone()));
        reducer.reduce(
            &mut state,
            &actions.error(
                ErrorInfo::Response {
                    status: 404,
                    body: json!("missing"),
                },
                b,
            ),
        );

        let slot_a = &state[&RequestKey::new("A")];
        let slot_b = &state[&RequestKey::new("B")];
        assert!(slot_a.sync);
        assert_eq!(slot_a.data, json!({"name": "a"}));
        assert!(!slot_b.sync);
        assert_eq!(slot_b.error.as_ref().and_then(ErrorInfo::status), Some(404));
    }

    #[test]
    fn test_endpoint_reducer_mode_follows_key_fn() {
        let id = EndpointId::new("test");
        let single = EndpointReducer::new(id.clone(), None);
        let keyed = EndpointReducer::new(id, Some(KeyFn::arg("id")));

        assert_eq!(single.initial_state(), EndpointState::Single(RequestState::default()));
        assert_eq!(keyed.initial_state(), EndpointState::Keyed(KeyedState::new()));
    }

    #[test]
    fn test_endpoint_reducer_recovers_from_mismatched_state() {
        let id = EndpointId::new("test");
        let keyed = EndpointReducer::new(id.clone(), Some(KeyFn::arg("id")));
        let action = ActionFactory::new(id).request(Method::Get, Args::new().with("id", 1));

        let state = keyed.fold(Some(EndpointState::default()), &action);

        let EndpointState::Keyed(slots) = state else {
            unreachable!("keyed reducer must produce keyed state");
        };
        assert!(slots[&RequestKey::new("1")].loading);
    }
}
