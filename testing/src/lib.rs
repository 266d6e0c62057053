//! # Super API Testing
//!
//! Testing utilities and helpers for Super API endpoints.
//!
//! This crate provides:
//! - [`MockHttpClient`]: scripted transport with per-URL replies and delays
//! - [`RecordingSink`]: captures emitted actions, can fail on a given phase
//! - [`ReducerTest`]: Given-When-Then harness for reducers
//! - [`init_tracing`]: log output for failing tests
//!
//! ## Example
//!
//! ```ignore
//! use super_api_testing::{MockHttpClient, MockReply, RecordingSink};
//!
//! #[tokio::test]
//! async fn test_fetch_planet() {
//!     let client = Arc::new(MockHttpClient::new()
//!         .on("/api/planets/1/", MockReply::ok(json!({"name": "Tatooine"}))));
//!     let sink = Arc::new(RecordingSink::new());
//!     let planets = Endpoint::new(definition, client, sink.clone());
//!
//!     planets.get(Args::new().with("planetId", 1), RequestOptions::new()).await.unwrap();
//!
//!     assert_eq!(sink.phases(), vec![Phase::Request, Phase::Success]);
//! }
//! ```

pub mod http_mocks;
pub mod reducer_test;

// Re-export commonly used items
pub use http_mocks::{MockHttpClient, MockReply, RecordingSink};
pub use reducer_test::{assertions, ReducerTest};

/// Install a test subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
