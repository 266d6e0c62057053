//! # Super API Core
//!
//! Pure building blocks for declarative HTTP endpoints.
//!
//! This crate contains everything about an endpoint that does not perform I/O:
//! URL templates, request keys, lifecycle actions and the reducers that fold
//! those actions into observable request state. The async shell that talks to
//! an HTTP transport lives in `super-api-runtime`.
//!
//! ## Core Concepts
//!
//! - **Endpoint**: a named, parametrized HTTP resource (`/api/planets/:planetId/`)
//! - **Key**: identity under which a call and its state are tracked
//! - **Action**: one of `request` / `success` / `error` / `reset`, tagged with the
//!   endpoint that produced it
//! - **Reducer**: pure fold `(State, Action) → State`
//!
//! ## Example
//!
//! ```
//! use super_api_core::{ActionFactory, Args, EndpointId, Method, Reducer, RequestReducer};
//! use serde_json::json;
//!
//! let id = EndpointId::new("planets");
//! let actions = ActionFactory::new(id.clone());
//! let reducer = RequestReducer::new(id);
//!
//! let state = reducer.fold(None, &actions.request(Method::Get, Args::new()));
//! assert!(state.loading);
//!
//! let state = reducer.fold(Some(state), &actions.success(json!({"name": "Mars"}), 200, Args::new()));
//! assert!(state.sync);
//! assert_eq!(state.data, json!({"name": "Mars"}));
//! ```

pub mod action;
pub mod args;
pub mod composition;
pub mod definition;
pub mod method;
pub mod options;
pub mod reducer;
pub mod state;
pub mod url;

pub use action::{ActionFactory, ActionKind, EndpointAction, EndpointId, ErrorInfo, Phase};
pub use args::{Args, KeyFn, RequestKey};
pub use composition::{ApiReducer, ApiState};
pub use definition::EndpointDefinition;
pub use method::Method;
pub use options::{DefaultOptions, RequestOptions};
pub use reducer::{EndpointReducer, KeyedReducer, Reducer, RequestReducer};
pub use state::{EndpointState, KeyedState, RequestPhase, RequestState, SyncLookup};
pub use url::UrlTemplate;

// Re-export so downstream crates agree on the payload type
pub use serde_json::Value;
