//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use super_api_core::Reducer;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// Starts from the reducer's initial state unless [`given_state`](Self::given_state)
/// is used, then reduces every action in order.
///
/// # Example
///
/// ```
/// use super_api_core::{Args, EndpointDefinition, Method, RequestPhase};
/// use super_api_testing::ReducerTest;
///
/// let people = EndpointDefinition::new("people", "/api/people/");
/// let actions = people.actions();
///
/// ReducerTest::new(people.reducer())
///     .when_action(actions.request(Method::Get, Args::new()))
///     .then_state(|state| {
///         let slot = state.slot(&Default::default()).cloned().unwrap_or_default();
///         assert_eq!(slot.phase(), RequestPhase::Loading);
///     })
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    initial_state: Option<R::State>,
    actions: Vec<R::Action>,
    state_assertions: Vec<StateAssertion<R::State>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            initial_state: None,
            actions: Vec::new(),
            state_assertions: Vec::new(),
        }
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Add an action to reduce (When)
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Add several actions to reduce in order (When)
    #[must_use]
    pub fn when_actions(mut self, actions: impl IntoIterator<Item = R::Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if any assertion fails.
    pub fn run(self) {
        let state = self.actions.iter().fold(self.initial_state, |state, action| {
            Some(self.reducer.fold(state, action))
        });
        let state = state.unwrap_or_else(|| self.reducer.initial_state());

        for assertion in self.state_assertions {
            assertion(&state);
        }
    }
}

/// Helper assertions for request slots
pub mod assertions {
    use super_api_core::{EndpointState, RequestKey, RequestPhase, RequestState};

    /// Assert that the slot for `key` exists and is in `phase`
    ///
    /// # Panics
    ///
    /// Panics if the slot is missing or in another phase.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_slot_phase(state: &EndpointState, key: &RequestKey, phase: RequestPhase) {
        let Some(slot) = state.slot(key) else {
            panic!("Expected a slot for key {key:?}, but none found in {state:?}");
        };
        assert_eq!(
            slot.phase(),
            phase,
            "Expected slot {key:?} to be {phase:?}, but it was {:?}",
            slot.phase()
        );
    }

    /// Assert that a slot has the default, never-requested shape
    ///
    /// # Panics
    ///
    /// Panics if any field differs from [`RequestState::default`].
    pub fn assert_pristine(slot: &RequestState) {
        assert_eq!(slot, &RequestState::default(), "Expected a pristine slot");
    }
}

#[cfg(test)]
mod tests {
    use super::assertions::{assert_pristine, assert_slot_phase};
    use super::*;
    use serde_json::json;
    use super_api_core::{Args, EndpointDefinition, KeyFn, Method, RequestKey, RequestPhase};

    fn planets() -> EndpointDefinition {
        EndpointDefinition::new("planets", "/api/planets/:planetId/").keyed_by(KeyFn::arg("planetId"))
    }

    #[test]
    fn test_keyed_success_after_request() {
        let planets = planets();
        let actions = planets.actions();
        let one = Args::new().with("planetId", 1);

        ReducerTest::new(planets.reducer())
            .when_actions([
                actions.request(Method::Get, one.clone()),
                actions.success(json!({"name": "Tatooine"}), 200, one),
            ])
            .then_state(|state| {
                assert_slot_phase(state, &RequestKey::new("1"), RequestPhase::Synced);
                assert_eq!(state.slot(&RequestKey::new("1")).map(|s| s.data["name"].clone()), Some(json!("Tatooine")));
            })
            .run();
    }

    #[test]
    fn test_reset_from_given_state() {
        let planets = planets();
        let actions = planets.actions();
        let one = Args::new().with("planetId", 1);
        let loading = planets.reducer().fold(None, &actions.request(Method::Get, one.clone()));

        ReducerTest::new(planets.reducer())
            .given_state(loading)
            .when_action(actions.reset(one))
            .then_state(|state| {
                assert_pristine(state.slot(&RequestKey::new("1")).unwrap_or(&Default::default()));
            })
            .run();
    }

    #[test]
    fn test_no_actions_yields_initial_state() {
        let planets = planets();
        let initial = planets.reducer().initial_state();

        ReducerTest::new(planets.reducer())
            .then_state(move |state| assert_eq!(state, &initial))
            .run();
    }
}
