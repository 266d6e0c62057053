//! The Store - reference state container for endpoint actions.
//!
//! The Store owns state produced by a [`Reducer`], applies every dispatched
//! action to it, then notifies observers:
//!
//! 1. reduce the action under the state lock
//! 2. broadcast the action to [`subscribe_actions`](Store::subscribe_actions) receivers
//! 3. run synchronous listeners registered with [`on_action`](Store::on_action)
//!
//! A failing listener surfaces as [`DispatchError::Listener`] from
//! [`EventSink::dispatch`]. The state change has already happened at that
//! point; the error belongs to the observer, not to the endpoint.
//!
//! # Example
//!
//! ```
//! use super_api_core::{Args, EndpointDefinition, Method};
//! use super_api_runtime::{EventSink, Store};
//!
//! let buckets = EndpointDefinition::new("buckets", "/api/buckets/");
//! let store = Store::new(buckets.reducer());
//!
//! store.dispatch(buckets.actions().request(Method::Get, Args::new())).ok();
//! assert!(store.state(|s| s.slot(&buckets.key(&Args::new())).is_some_and(|slot| slot.loading)));
//! ```

use crate::error::DispatchError;
use crate::metrics::STORE_ACTIONS_TOTAL;
use crate::sink::EventSink;
use std::sync::{Arc, PoisonError, RwLock};
use super_api_core::{EndpointAction, EndpointId, Reducer, RequestKey, SyncLookup};
use tokio::sync::broadcast;

/// Error type listeners may return
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

type Listener<A> = Arc<dyn Fn(&A) -> Result<(), ListenerError> + Send + Sync>;

/// Default capacity of the action broadcast channel
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// State container driven by a reducer.
pub struct Store<R>
where
    R: Reducer,
{
    state: RwLock<R::State>,
    reducer: R,
    action_broadcast: broadcast::Sender<R::Action>,
    listeners: RwLock<Vec<Listener<R::Action>>>,
}

impl<R> Store<R>
where
    R: Reducer,
    R::Action: Clone,
{
    /// Create a store starting from the reducer's initial state.
    #[must_use]
    pub fn new(reducer: R) -> Self {
        Self::with_broadcast_capacity(reducer, DEFAULT_BROADCAST_CAPACITY)
    }

    /// Create a store with a custom action broadcast capacity.
    ///
    /// Increase the capacity when slow subscribers frequently lag.
    #[must_use]
    pub fn with_broadcast_capacity(reducer: R, capacity: usize) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity.max(1));
        Self {
            state: RwLock::new(reducer.initial_state()),
            reducer,
            action_broadcast,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// The reducer driving this store
    pub const fn reducer(&self) -> &R {
        &self.reducer
    }

    /// Apply an action and notify observers.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Listener`] with the first listener failure.
    /// Later listeners are not run.
    pub fn send(&self, action: R::Action) -> Result<(), DispatchError> {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            self.reducer.reduce(&mut state, &action);
        }
        metrics::counter!(STORE_ACTIONS_TOTAL).increment(1);

        // No receivers is fine
        let _ = self.action_broadcast.send(action.clone());

        // Listeners run without the lock held so they may register others
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in &listeners {
            listener(&action).map_err(DispatchError::Listener)?;
        }
        Ok(())
    }

    /// Read current state via a closure.
    ///
    /// ```ignore
    /// let loading = store.state(|s| s.loading);
    /// ```
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&R::State) -> T,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> R::State
    where
        R::State: Clone,
    {
        self.state(Clone::clone)
    }

    /// Replace the state with the reducer's initial state.
    pub fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = self.reducer.initial_state();
    }

    /// Subscribe to every action applied from now on.
    ///
    /// If the receiver lags it skips old actions and gets
    /// [`RecvError::Lagged`](broadcast::error::RecvError::Lagged).
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<R::Action> {
        self.action_broadcast.subscribe()
    }

    /// Register a synchronous listener, run after each action is applied.
    ///
    /// A listener registered while an action is being delivered first runs
    /// for the next action.
    pub fn on_action<F>(&self, listener: F)
    where
        F: Fn(&R::Action) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }
}

impl<R> EventSink for Store<R>
where
    R: Reducer<Action = EndpointAction> + Send + Sync,
    R::State: Send + Sync,
{
    fn dispatch(&self, action: EndpointAction) -> Result<(), DispatchError> {
        self.send(action)
    }
}

impl<R> SyncLookup for Store<R>
where
    R: Reducer,
    R::Action: Clone,
    R::State: SyncLookup,
{
    fn is_synced(&self, endpoint: &EndpointId, key: &RequestKey) -> bool {
        self.state(|state| state.is_synced(endpoint, key))
    }
}

impl<R> std::fmt::Debug for Store<R>
where
    R: Reducer,
    R::State: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("subscribers", &self.action_broadcast.receiver_count())
            .finish_non_exhaustive()
    }
}
