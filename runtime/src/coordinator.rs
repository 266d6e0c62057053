//! Request coordinator - runs one call end-to-end.
//!
//! # Lifecycle of `execute`
//!
//! ```text
//! key = key_fn(args)
//! handle = registry.supersede(key)     abort any call sharing the key, track this one
//! sink ← request                       observers see `loading` immediately
//! transport(url, options, signal)      the only suspension point
//! registry.settle(key, generation)
//!   ├─ Stale      → drop the outcome, Err(Superseded)
//!   ├─ Cancelled  → sink ← error("request cancelled"), Err(Cancelled)
//!   └─ Current
//!        ├─ failure stage: sink ← error, Err(Http)
//!        └─ success stage: sink ← success, Ok(response)
//! ```
//!
//! The failure and success stages are separate: an error returned by the
//! sink while delivering `success` is passed to the caller as
//! [`RequestError::Dispatch`] and never produces an `error` action.

use crate::error::{HttpError, RequestError};
use crate::http::{HttpClient, HttpRequest, HttpResponse};
use crate::metrics::{
    CANCELLATIONS_TOTAL, REQUESTS_DEDUPLICATED, REQUESTS_FAILED, REQUESTS_STALE, REQUESTS_TOTAL,
    REQUEST_DURATION,
};
use crate::registry::{CancelHandle, CancellationRegistry, Settlement};
use crate::sink::EventSink;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use super_api_core::{
    ActionFactory, Args, EndpointDefinition, EndpointId, ErrorInfo, Method, RequestKey,
    RequestOptions, SyncLookup,
};

/// Orchestrates calls for one endpoint.
pub struct RequestCoordinator {
    definition: EndpointDefinition,
    actions: ActionFactory,
    registry: CancellationRegistry,
    client: Arc<dyn HttpClient>,
    sink: Arc<dyn EventSink>,
}

impl RequestCoordinator {
    /// Coordinator for `definition`, calling `client` and emitting into `sink`.
    #[must_use]
    pub fn new(
        definition: EndpointDefinition,
        client: Arc<dyn HttpClient>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            actions: definition.actions(),
            definition,
            registry: CancellationRegistry::new(),
            client,
            sink,
        }
    }

    /// Endpoint being coordinated
    #[must_use]
    pub const fn definition(&self) -> &EndpointDefinition {
        &self.definition
    }

    /// Endpoint identity
    #[must_use]
    pub const fn id(&self) -> &EndpointId {
        self.definition.id()
    }

    /// In-flight call bookkeeping
    #[must_use]
    pub const fn registry(&self) -> &CancellationRegistry {
        &self.registry
    }

    /// Whether a call is in flight for `args`' key
    #[must_use]
    pub fn is_pending(&self, args: &Args) -> bool {
        self.registry.is_pending(&self.definition.key(args))
    }

    /// Run one call.
    ///
    /// # Errors
    ///
    /// - [`RequestError::Http`] when the transport fails (after the `error` action)
    /// - [`RequestError::Cancelled`] when [`cancel`](Self::cancel) aborted the call
    /// - [`RequestError::Superseded`] when a newer call for the key replaced this one
    /// - [`RequestError::Dispatch`] when the sink rejects an action
    #[tracing::instrument(
        skip(self, args, options, payload),
        fields(endpoint = %self.definition.id(), %method, key = tracing::field::Empty)
    )]
    pub async fn execute(
        &self,
        method: Method,
        args: Args,
        options: RequestOptions,
        payload: Option<Value>,
    ) -> Result<HttpResponse, RequestError> {
        let key = self.definition.key(&args);
        tracing::Span::current().record("key", tracing::field::display(&key));

        let (superseded, handle) = self.registry.supersede(key);
        let guard = TrackingGuard::new(&self.registry, &handle);
        if superseded {
            metrics::counter!(CANCELLATIONS_TOTAL, "endpoint" => self.endpoint_label())
                .increment(1);
            tracing::debug!("Superseding in-flight call for the same key");
        }

        self.sink.dispatch(self.actions.request(method, args.clone()))?;
        metrics::counter!(REQUESTS_TOTAL, "endpoint" => self.endpoint_label(), "method" => method.as_str())
            .increment(1);

        let request = HttpRequest {
            method,
            url: self.definition.url(&args),
            payload,
            options: self.definition.defaults().resolve(method, &options),
        };
        tracing::debug!(url = %request.url, "Issuing request");

        let start = Instant::now();
        let signal = handle.signal();
        let outcome = tokio::select! {
            biased;
            () = signal.cancelled() => Err(HttpError::Cancelled),
            result = self.client.request(request, handle.signal()) => result,
        };
        metrics::histogram!(REQUEST_DURATION, "endpoint" => self.endpoint_label())
            .record(start.elapsed().as_secs_f64());

        match guard.settle() {
            Settlement::Current => {},
            Settlement::Stale => {
                metrics::counter!(REQUESTS_STALE, "endpoint" => self.endpoint_label())
                    .increment(1);
                tracing::debug!("Discarding stale completion");
                return Err(RequestError::Superseded);
            },
            Settlement::Cancelled => {
                self.fail(&HttpError::Cancelled, args)?;
                return Err(RequestError::Cancelled);
            },
        }

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                self.fail(&error, args)?;
                return Err(RequestError::Http(error));
            },
        };

        self.succeed(response, args)
    }

    /// Failure stage: emit the `error` action.
    fn fail(&self, error: &HttpError, args: Args) -> Result<(), RequestError> {
        metrics::counter!(REQUESTS_FAILED, "endpoint" => self.endpoint_label())
            .increment(1);
        tracing::warn!(error = %error, status = ?error.status(), "Request failed");
        self.sink
            .dispatch(self.actions.error(ErrorInfo::from(error), args))?;
        Ok(())
    }

    /// Success stage: emit the `success` action.
    fn succeed(&self, response: HttpResponse, args: Args) -> Result<HttpResponse, RequestError> {
        tracing::debug!(status = response.status, "Request succeeded");
        self.sink.dispatch(
            self.actions
                .success(response.data.clone(), response.status, args),
        )?;
        Ok(response)
    }

    /// Run a call unless one is in flight for the key or its slot is already synced.
    ///
    /// Returns `Ok(None)` without emitting anything when the call is skipped.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub async fn execute_once(
        &self,
        method: Method,
        args: Args,
        options: RequestOptions,
        state: &(impl SyncLookup + ?Sized),
    ) -> Result<Option<HttpResponse>, RequestError> {
        let key = self.definition.key(&args);
        if self.registry.is_pending(&key) || state.is_synced(self.definition.id(), &key) {
            metrics::counter!(REQUESTS_DEDUPLICATED, "endpoint" => self.endpoint_label())
                .increment(1);
            tracing::debug!(endpoint = %self.definition.id(), key = %key, "Skipping call, already fetched or fetching");
            return Ok(None);
        }
        self.execute(method, args, options, None).await.map(Some)
    }

    /// Abort the in-flight call for `args`' key, if any.
    ///
    /// The aborted call emits an `error` action and its caller receives
    /// [`RequestError::Cancelled`]. Returns whether a call was aborted.
    pub fn cancel(&self, args: &Args) -> bool {
        let key = self.definition.key(args);
        let cancelled = self.registry.cancel_explicit(&key);
        if cancelled {
            metrics::counter!(CANCELLATIONS_TOTAL, "endpoint" => self.endpoint_label())
                .increment(1);
        }
        cancelled
    }

    /// Abort the in-flight call for `args`' key and emit `reset`.
    ///
    /// The aborted call settles silently; its slot returns to the default state.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Dispatch`] if the sink rejects the action.
    pub fn reset(&self, args: Args) -> Result<(), RequestError> {
        let key = self.definition.key(&args);
        if self.registry.cancel(&key) {
            metrics::counter!(CANCELLATIONS_TOTAL, "endpoint" => self.endpoint_label())
                .increment(1);
        }
        tracing::debug!(endpoint = %self.definition.id(), key = %key, "Resetting");
        self.sink.dispatch(self.actions.reset(args))?;
        Ok(())
    }

    fn endpoint_label(&self) -> String {
        self.definition.name().to_string()
    }
}

impl std::fmt::Debug for RequestCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoordinator")
            .field("endpoint", self.definition.id())
            .field("pending", &self.registry.pending_count())
            .finish_non_exhaustive()
    }
}

/// Releases a tracked call if the `execute` future is dropped before it settles.
///
/// Without this a dropped caller would leave its key pending forever, and
/// every later dedup fetch for it would be skipped.
struct TrackingGuard<'a> {
    registry: &'a CancellationRegistry,
    key: RequestKey,
    generation: u64,
    armed: bool,
}

impl<'a> TrackingGuard<'a> {
    fn new(registry: &'a CancellationRegistry, handle: &CancelHandle) -> Self {
        Self {
            registry,
            key: handle.key().clone(),
            generation: handle.generation(),
            armed: true,
        }
    }

    fn settle(mut self) -> Settlement {
        self.armed = false;
        self.registry.settle(&self.key, self.generation)
    }
}

impl Drop for TrackingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.release(&self.key, self.generation);
        }
    }
}
