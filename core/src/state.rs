//! Observable request state.
//!
//! A [`RequestState`] is one slot of the lifecycle state machine:
//!
//! ```text
//!            request               success
//!   Idle ─────────────▶ Loading ─────────────▶ Synced
//!     ▲                  │   ▲                   │
//!     │            error │   └──── request ──────┤
//!     │                  ▼                       │
//!     │                Failed ── request ──▶ Loading
//!     │
//!     └──────────── reset (from any state)
//! ```
//!
//! `data` is only ever replaced by a `success`; `request` and `error` leave
//! the last good value in place so consumers keep rendering it during a
//! refresh.

use crate::action::{ActionKind, EndpointId, ErrorInfo};
use crate::args::RequestKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// State of one request slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestState {
    /// A call is in flight
    pub loading: bool,
    /// A call is in flight (kept alongside `loading` for consumers of either)
    pub syncing: bool,
    /// The last call succeeded and `data` holds its result
    pub sync: bool,
    /// Last successfully fetched payload
    pub data: Value,
    /// Last failure, cleared by `request` and `success`
    pub error: Option<ErrorInfo>,
}

impl Default for RequestState {
    fn default() -> Self {
        Self {
            loading: false,
            syncing: false,
            sync: false,
            data: Value::Object(Map::new()),
            error: None,
        }
    }
}

/// Named states of the slot state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    /// Nothing requested yet, or reset
    Idle,
    /// A call is in flight
    Loading,
    /// The last call succeeded
    Synced,
    /// The last call failed
    Failed,
}

impl RequestState {
    /// Derived state-machine phase.
    #[must_use]
    pub const fn phase(&self) -> RequestPhase {
        if self.loading {
            RequestPhase::Loading
        } else if self.sync {
            RequestPhase::Synced
        } else if self.error.is_some() {
            RequestPhase::Failed
        } else {
            RequestPhase::Idle
        }
    }

    /// Apply one lifecycle transition.
    pub fn apply(&mut self, kind: &ActionKind) {
        match kind {
            ActionKind::Request { .. } => {
                self.loading = true;
                self.syncing = true;
                self.sync = false;
                self.error = None;
            },
            ActionKind::Success { data, .. } => {
                self.loading = false;
                self.syncing = false;
                self.sync = true;
                self.data = data.clone();
                self.error = None;
            },
            ActionKind::Error(info) => {
                self.loading = false;
                self.syncing = false;
                self.sync = false;
                self.error = Some(info.clone());
            },
            ActionKind::Reset => *self = Self::default(),
        }
    }
}

/// Per-key slots of a multiplexed endpoint.
pub type KeyedState = BTreeMap<RequestKey, RequestState>;

/// State of one endpoint, in either mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointState {
    /// Endpoint without a key function
    Single(RequestState),
    /// Endpoint with a key function
    Keyed(KeyedState),
}

impl Default for EndpointState {
    fn default() -> Self {
        Self::Single(RequestState::default())
    }
}

impl EndpointState {
    /// Slot for `key`. Single-slot state answers for every key.
    #[must_use]
    pub fn slot(&self, key: &RequestKey) -> Option<&RequestState> {
        match self {
            Self::Single(state) => Some(state),
            Self::Keyed(slots) => slots.get(key),
        }
    }
}

/// Answers "has this slot already been fetched successfully?".
///
/// Used by dedup fetches to skip calls whose result is already in state.
pub trait SyncLookup {
    /// Whether the slot `key` of `endpoint` reports `sync = true`.
    fn is_synced(&self, endpoint: &EndpointId, key: &RequestKey) -> bool;
}

impl SyncLookup for RequestState {
    fn is_synced(&self, _endpoint: &EndpointId, _key: &RequestKey) -> bool {
        self.sync
    }
}

impl SyncLookup for KeyedState {
    fn is_synced(&self, _endpoint: &EndpointId, key: &RequestKey) -> bool {
        self.get(key).is_some_and(|slot| slot.sync)
    }
}

impl SyncLookup for EndpointState {
    fn is_synced(&self, _endpoint: &EndpointId, key: &RequestKey) -> bool {
        self.slot(key).is_some_and(|slot| slot.sync)
    }
}

impl<T: SyncLookup + ?Sized> SyncLookup for &T {
    fn is_synced(&self, endpoint: &EndpointId, key: &RequestKey) -> bool {
        (**self).is_synced(endpoint, key)
    }
}
