//! In-memory transport and sink for endpoint tests
//!
//! Provides deterministic stand-ins for the runtime's two I/O seams:
//! - [`MockHttpClient`]: scripted replies per URL, with optional delays
//! - [`RecordingSink`]: captures every emitted action, optionally failing on a phase

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use super_api_core::{EndpointAction, Phase};
use super_api_runtime::{
    CancelSignal, DispatchError, EventSink, HttpClient, HttpError, HttpRequest, HttpResponse,
};

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub struct MockReply {
    outcome: Result<HttpResponse, HttpError>,
    delay: Duration,
}

impl MockReply {
    /// `200` with `data`
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self::status(200, data)
    }

    /// A 2xx `status` with `data`
    #[must_use]
    pub fn status(status: u16, data: Value) -> Self {
        Self {
            outcome: Ok(HttpResponse { status, data }),
            delay: Duration::ZERO,
        }
    }

    /// A non-2xx `status` with `body`
    #[must_use]
    pub fn error(status: u16, body: Value) -> Self {
        Self {
            outcome: Err(HttpError::Response { status, body }),
            delay: Duration::ZERO,
        }
    }

    /// A transport failure
    #[must_use]
    pub fn transport(message: &str) -> Self {
        Self {
            outcome: Err(HttpError::transport(message)),
            delay: Duration::ZERO,
        }
    }

    /// Resolve only after `delay`
    #[must_use]
    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Scripted [`HttpClient`].
///
/// Replies queued for a URL are consumed in order; the last one is reused
/// once the queue is down to it. URLs without replies fail with a transport
/// error. Every call is logged before its delay starts.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use super_api_testing::{MockHttpClient, MockReply};
///
/// let client = MockHttpClient::new()
///     .on("/api/planets/1/", MockReply::ok(json!({"name": "Tatooine"})));
/// assert_eq!(client.call_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    replies: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    calls: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockHttpClient {
    /// Client with no scripted replies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `url`, builder style
    #[must_use]
    pub fn on(self, url: &str, reply: MockReply) -> Self {
        self.push(url, reply);
        self
    }

    /// Queue a reply for `url`
    pub fn push(&self, url: &str, reply: MockReply) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Every call made so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made so far
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of calls made to `url`
    #[must_use]
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.url == url).count()
    }

    fn next_reply(&self, url: &str) -> Option<MockReply> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn request(
        &self,
        request: HttpRequest,
        cancel: CancelSignal,
    ) -> Result<HttpResponse, HttpError> {
        let url = request.url.clone();
        let method = request.method;
        self.calls.lock().unwrap().push(request);

        let Some(reply) = self.next_reply(&url) else {
            return Err(HttpError::transport(format!("no mock reply for {method} {url}")));
        };

        if !reply.delay.is_zero() {
            tokio::select! {
                () = cancel.cancelled() => return Err(HttpError::Cancelled),
                () = tokio::time::sleep(reply.delay) => {},
            }
        }
        reply.outcome
    }
}

/// [`EventSink`] that records every action.
///
/// # Example
///
/// ```
/// use super_api_core::{Args, EndpointDefinition, Method};
/// use super_api_runtime::EventSink;
/// use super_api_testing::RecordingSink;
///
/// let sink = RecordingSink::new();
/// let people = EndpointDefinition::new("people", "/api/people/");
/// sink.dispatch(people.actions().request(Method::Get, Args::new())).ok();
/// assert_eq!(sink.types(), vec!["@@super-api@people_request"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    actions: Arc<Mutex<Vec<EndpointAction>>>,
    fail_on: Arc<Mutex<Option<Phase>>>,
}

impl RecordingSink {
    /// Empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record actions of `phase`, then reject them with a listener error
    #[must_use]
    pub fn failing_on(self, phase: Phase) -> Self {
        *self.fail_on.lock().unwrap() = Some(phase);
        self
    }

    /// Recorded actions, in order
    #[must_use]
    pub fn actions(&self) -> Vec<EndpointAction> {
        self.actions.lock().unwrap().clone()
    }

    /// Wire types of the recorded actions
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        self.actions.lock().unwrap().iter().map(EndpointAction::type_name).collect()
    }

    /// Phases of the recorded actions
    #[must_use]
    pub fn phases(&self) -> Vec<Phase> {
        self.actions.lock().unwrap().iter().map(EndpointAction::phase).collect()
    }

    /// Number of recorded actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.lock().unwrap().len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.lock().unwrap().is_empty()
    }

    /// Forget recorded actions (for test isolation)
    pub fn clear(&self) {
        self.actions.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn dispatch(&self, action: EndpointAction) -> Result<(), DispatchError> {
        let phase = action.phase();
        self.actions.lock().unwrap().push(action);
        if *self.fail_on.lock().unwrap() == Some(phase) {
            return Err(DispatchError::Listener(
                format!("listener rejected {} action", phase.as_str()).into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use super_api_core::{Method, RequestOptions};

    fn get(url: &str) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: url.to_string(),
            payload: None,
            options: RequestOptions::new(),
        }
    }

    #[tokio::test]
    async fn test_replies_are_consumed_in_order_and_last_is_sticky() {
        let client = MockHttpClient::new()
            .on("/a", MockReply::ok(json!(1)))
            .on("/a", MockReply::error(500, json!("boom")));

        let first = client.request(get("/a"), CancelSignal::never()).await;
        let second = client.request(get("/a"), CancelSignal::never()).await;
        let third = client.request(get("/a"), CancelSignal::never()).await;

        assert_eq!(first.unwrap().data, json!(1));
        assert_eq!(second.unwrap_err().status(), Some(500));
        assert_eq!(third.unwrap_err().status(), Some(500));
        assert_eq!(client.calls_to("/a"), 3);
    }

    #[tokio::test]
    async fn test_unscripted_url_is_transport_error() {
        let client = MockHttpClient::new();
        let result = client.request(get("/nowhere"), CancelSignal::never()).await;
        assert!(matches!(result, Err(HttpError::Transport { .. })));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_reply_observes_cancel() {
        let client = MockHttpClient::new()
            .on("/slow", MockReply::ok(json!(1)).after(Duration::from_secs(10)));
        let (trigger, signal) = CancelSignal::channel();

        let (result, ()) = tokio::join!(client.request(get("/slow"), signal), async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            trigger.send_replace(true);
        });

        assert_eq!(result, Err(HttpError::Cancelled));
    }

    #[test]
    fn test_failing_sink_still_records() {
        let sink = RecordingSink::new().failing_on(Phase::Success);
        let actions = super_api_core::EndpointDefinition::new("people", "/api/people/").actions();

        assert!(sink.dispatch(actions.request(Method::Get, super_api_core::Args::new())).is_ok());
        assert!(sink
            .dispatch(actions.success(json!([]), 200, super_api_core::Args::new()))
            .is_err());
        assert_eq!(sink.phases(), vec![Phase::Request, Phase::Success]);
    }
}
