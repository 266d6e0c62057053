//! Prometheus metrics for endpoint calls and store dispatch.
//!
//! Metrics are always recorded through the [`metrics`] facade. Installing the
//! exporter is optional; without a recorder the macros are no-ops.
//!
//! # Example
//!
//! ```rust,no_run
//! use super_api_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! // ... run endpoints ...
//!
//! if let Some(text) = exporter.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Calls issued, labelled by endpoint and method
pub const REQUESTS_TOTAL: &str = "endpoint.requests.total";
/// Calls that ended in an `error` action
pub const REQUESTS_FAILED: &str = "endpoint.requests.failed";
/// Completions discarded because a newer call replaced them
pub const REQUESTS_STALE: &str = "endpoint.requests.stale";
/// `once` calls skipped because the key was in flight or synced
pub const REQUESTS_DEDUPLICATED: &str = "endpoint.requests.deduplicated";
/// In-flight calls aborted
pub const CANCELLATIONS_TOTAL: &str = "endpoint.cancellations.total";
/// Transport round-trip time
pub const REQUEST_DURATION: &str = "endpoint.request.duration_seconds";
/// Actions applied by stores
pub const STORE_ACTIONS_TOTAL: &str = "store.actions.total";

/// Errors from metrics setup.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build the exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install the exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// In-process Prometheus exporter.
///
/// Renders the text exposition format on demand; serving it over HTTP is
/// left to the application.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Exporter that has not been installed yet
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe all metrics and install the Prometheus recorder globally.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the recorder cannot be built or installed.
    /// A recorder that is already installed is not an error; `render` then
    /// returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                describe_metrics();
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            },
            Err(e) => {
                let message = e.to_string();
                if message.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping");
                    Ok(())
                } else {
                    Err(MetricsError::Install(message))
                }
            },
        }
    }

    /// Handle of the installed recorder
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Current metrics in Prometheus text format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

/// Register descriptions for every metric the runtime records.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of endpoint calls issued");
    describe_counter!(REQUESTS_FAILED, "Endpoint calls that emitted an error action");
    describe_counter!(REQUESTS_STALE, "Completions discarded after being superseded");
    describe_counter!(
        REQUESTS_DEDUPLICATED,
        "Fetch-once calls skipped because the key was in flight or synced"
    );
    describe_counter!(CANCELLATIONS_TOTAL, "In-flight endpoint calls aborted");
    describe_histogram!(REQUEST_DURATION, Unit::Seconds, "Transport round-trip time");
    describe_counter!(STORE_ACTIONS_TOTAL, "Actions applied by stores");
}
