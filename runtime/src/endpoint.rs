//! Callable endpoint - the per-verb surface over a [`RequestCoordinator`].

use crate::coordinator::RequestCoordinator;
use crate::error::RequestError;
use crate::http::{HttpClient, HttpResponse};
use crate::sink::EventSink;
use serde_json::Value;
use std::sync::Arc;
use super_api_core::{
    Args, EndpointDefinition, EndpointId, EndpointReducer, EndpointState, Method, Reducer,
    RequestOptions, SyncLookup,
};

/// One named HTTP resource with its lifecycle state.
///
/// Cheap to clone; clones share the same in-flight call bookkeeping.
///
/// # Example
///
/// ```ignore
/// let planets = Endpoint::new(
///     EndpointDefinition::new("planets", "/api/planets/:planetId/")
///         .keyed_by(KeyFn::arg("planetId")),
///     client,
///     store.clone(),
/// );
///
/// planets.get(Args::new().with("planetId", 4), RequestOptions::new()).await?;
/// ```
#[derive(Clone, Debug)]
pub struct Endpoint {
    coordinator: Arc<RequestCoordinator>,
}

impl Endpoint {
    /// Build an endpoint from its definition.
    #[must_use]
    pub fn new(
        definition: EndpointDefinition,
        client: Arc<dyn HttpClient>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            coordinator: Arc::new(RequestCoordinator::new(definition, client, sink)),
        }
    }

    /// Endpoint identity
    #[must_use]
    pub fn id(&self) -> &EndpointId {
        self.coordinator.id()
    }

    /// Endpoint name
    #[must_use]
    pub fn name(&self) -> &str {
        self.coordinator.id().name()
    }

    /// Declarative definition
    #[must_use]
    pub fn definition(&self) -> &EndpointDefinition {
        self.coordinator.definition()
    }

    /// Underlying coordinator
    #[must_use]
    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    /// `GET` the resource.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn get(&self, args: Args, options: RequestOptions) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(Method::Get, args, options, None).await
    }

    /// `DELETE` the resource.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn delete(&self, args: Args, options: RequestOptions) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(Method::Delete, args, options, None).await
    }

    /// `HEAD` the resource.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn head(&self, args: Args, options: RequestOptions) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(Method::Head, args, options, None).await
    }

    /// `OPTIONS` on the resource.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn options(&self, args: Args, options: RequestOptions) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(Method::Options, args, options, None).await
    }

    /// `POST` a payload.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn post(
        &self,
        args: Args,
        payload: Value,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(Method::Post, args, options, Some(payload)).await
    }

    /// `PUT` a payload.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn put(
        &self,
        args: Args,
        payload: Value,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(Method::Put, args, options, Some(payload)).await
    }

    /// `PATCH` with a payload.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn patch(
        &self,
        args: Args,
        payload: Value,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(Method::Patch, args, options, Some(payload)).await
    }

    /// Any verb, with an optional payload.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn request(
        &self,
        method: Method,
        args: Args,
        payload: Option<Value>,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.coordinator.execute(method, args, options, payload).await
    }

    /// `GET` only if nothing is in flight for the key and its slot is not synced.
    ///
    /// `state` is usually the store the endpoint dispatches into.
    ///
    /// # Errors
    ///
    /// See [`RequestCoordinator::execute`].
    pub async fn once(
        &self,
        args: Args,
        options: RequestOptions,
        state: &(impl SyncLookup + ?Sized),
    ) -> Result<Option<HttpResponse>, RequestError> {
        self.coordinator
            .execute_once(Method::Get, args, options, state)
            .await
    }

    /// Abort the in-flight call for `args`' key. Returns whether one was aborted.
    pub fn cancel(&self, args: &Args) -> bool {
        self.coordinator.cancel(args)
    }

    /// Abort the in-flight call for `args`' key and reset its slot.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Dispatch`] if the sink rejects the action.
    pub fn reset(&self, args: Args) -> Result<(), RequestError> {
        self.coordinator.reset(args)
    }

    /// Whether a call is in flight for `args`' key
    #[must_use]
    pub fn is_pending(&self, args: &Args) -> bool {
        self.coordinator.is_pending(args)
    }

    /// Reducer of this endpoint's state, for registration with a store.
    #[must_use]
    pub fn reducer(&self) -> EndpointReducer {
        self.definition().reducer()
    }

    /// State before any action
    #[must_use]
    pub fn initial_state(&self) -> EndpointState {
        self.reducer().initial_state()
    }
}
