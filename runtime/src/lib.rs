//! # Super API Runtime
//!
//! Runtime for Super API endpoints: runs calls, tracks them per key, and
//! feeds their lifecycle actions into a [`Store`].
//!
//! ## Core Components
//!
//! - **Endpoint**: per-verb call surface (`get`, `post`, `once`, `cancel`, `reset`)
//! - **`RequestCoordinator`**: runs one call end-to-end and emits its actions
//! - **`CancellationRegistry`**: at most one live call per key; stale completions are dropped
//! - **Store**: applies actions with a [`Reducer`](super_api_core::Reducer) and notifies observers
//! - **Api**: registry of endpoints sharing a namespace, transport and sink
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use super_api_core::{Args, EndpointDefinition, KeyFn, RequestOptions};
//! use super_api_runtime::{ClientConfig, Endpoint, ReqwestClient, Store};
//!
//! let planets = EndpointDefinition::new("planets", "/api/planets/:planetId/")
//!     .keyed_by(KeyFn::arg("planetId"));
//! let store = Arc::new(Store::new(planets.reducer()));
//! let client = Arc::new(ReqwestClient::new(ClientConfig::from_env()?)?);
//! let planets = Endpoint::new(planets, client, store.clone());
//!
//! planets.get(Args::new().with("planetId", 1), RequestOptions::new()).await?;
//! let name = store.state(|s| s.slot(&"1".into()).map(|slot| slot.data["name"].clone()));
//! ```

/// Endpoint registry
pub mod api;

/// Client and registry configuration
pub mod config;

/// Runs one call end-to-end
pub mod coordinator;

/// Per-verb endpoint surface
pub mod endpoint;

/// Error types
pub mod error;

/// Transport seam
pub mod http;

/// Prometheus metrics for observability
pub mod metrics;

/// Per-key bookkeeping of in-flight calls
pub mod registry;

/// `reqwest` transport
pub mod reqwest_client;

/// Destination of lifecycle actions
pub mod sink;

/// Reference state container
pub mod store;

pub use api::{Api, ApiBuilder};
pub use config::{ApiConfig, ClientConfig, EndpointConfig};
pub use coordinator::RequestCoordinator;
pub use endpoint::Endpoint;
pub use error::{ConfigError, DispatchError, HttpError, RequestError};
pub use http::{CancelSignal, HttpClient, HttpRequest, HttpResponse};
pub use registry::{CancelHandle, CancellationRegistry, Settlement};
pub use reqwest_client::ReqwestClient;
pub use sink::EventSink;
pub use store::{ListenerError, Store};
