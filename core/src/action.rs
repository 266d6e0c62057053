//! Lifecycle actions emitted by an endpoint.
//!
//! An endpoint communicates with its reducer (and any other observer) through
//! exactly four kinds of action: `request`, `success`, `error` and `reset`.
//! Actions carry the [`EndpointId`] that produced them as data; the string
//! form `<namespace>@<name>_<phase>` only exists at the wire boundary
//! ([`EndpointAction::type_name`], [`EndpointAction::to_wire`]).

use crate::args::Args;
use crate::method::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

/// Default registry namespace.
pub const DEFAULT_NAMESPACE: &str = "@@super-api";

/// Identity of an endpoint: registry namespace plus endpoint name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointId {
    namespace: Arc<str>,
    name: Arc<str>,
}

impl EndpointId {
    /// Endpoint in the default namespace
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE, name)
    }

    /// Endpoint in an explicit namespace
    #[must_use]
    pub fn with_namespace(namespace: &str, name: &str) -> Self {
        Self {
            namespace: Arc::from(namespace),
            name: Arc::from(name),
        }
    }

    /// Registry namespace
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Endpoint name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<namespace>@<name>`, the prefix of every action type of this endpoint.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}@{}", self.namespace, self.name)
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.namespace, self.name)
    }
}

/// Lifecycle phase of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// A call was issued
    Request,
    /// A call completed with a 2xx response
    Success,
    /// A call failed
    Error,
    /// State was explicitly reset
    Reset,
}

impl Phase {
    /// Wire suffix
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Success => "success",
            Self::Error => "error",
            Self::Reset => "reset",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong with a call.
///
/// The two shapes must stay distinguishable: a response error carries a
/// remote body that the UI may render, a transport error only a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorInfo {
    /// The remote answered with a non-2xx status.
    Response {
        /// HTTP status code
        status: u16,
        /// Response body
        body: Value,
    },
    /// The call never completed.
    Transport {
        /// Human-readable failure description
        message: String,
    },
}

impl ErrorInfo {
    /// Status code, present only for response errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }

    /// The error payload as it appears on the wire.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Response { body, .. } => body.clone(),
            Self::Transport { message } => Value::String(message.clone()),
        }
    }
}

/// Phase-specific content of an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionKind {
    /// A call was issued with this verb.
    Request {
        /// HTTP verb
        method: Method,
    },
    /// A call succeeded.
    Success {
        /// Response body
        data: Value,
        /// HTTP status code
        status: u16,
    },
    /// A call failed.
    Error(ErrorInfo),
    /// The slot was reset.
    Reset,
}

impl ActionKind {
    /// Phase of this kind
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Request { .. } => Phase::Request,
            Self::Success { .. } => Phase::Success,
            Self::Error(_) => Phase::Error,
            Self::Reset => Phase::Reset,
        }
    }
}

/// A lifecycle action produced by one endpoint for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointAction {
    /// Producing endpoint
    pub endpoint: EndpointId,
    /// Arguments of the triggering call
    pub args: Args,
    /// Phase-specific content
    pub kind: ActionKind,
}

impl EndpointAction {
    /// Lifecycle phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.kind.phase()
    }

    /// Wire type string, e.g. `@@super-api@planets_success`.
    #[must_use]
    pub fn type_name(&self) -> String {
        format!("{}_{}", self.endpoint, self.phase())
    }

    /// Whether this action was produced by `endpoint`.
    #[must_use]
    pub fn is_from(&self, endpoint: &EndpointId) -> bool {
        &self.endpoint == endpoint
    }

    /// JSON wire representation.
    ///
    /// ```text
    /// { "type": "@@super-api@planets_request", "args": {...}, "method": "get" }
    /// { "type": "@@super-api@planets_success", "args": {...}, "data": ..., "status": 200 }
    /// { "type": "@@super-api@planets_error",   "args": {...}, "error": ..., "status": 500 }
    /// { "type": "@@super-api@planets_error",   "args": {...}, "error": "timed out" }
    /// { "type": "@@super-api@planets_reset",   "args": {...} }
    /// ```
    #[must_use]
    pub fn to_wire(&self) -> Value {
        let mut wire = json!({
            "type": self.type_name(),
            "args": self.args,
        });
        if let Value::Object(fields) = &mut wire {
            match &self.kind {
                ActionKind::Request { method } => {
                    fields.insert("method".into(), json!(method));
                },
                ActionKind::Success { data, status } => {
                    fields.insert("data".into(), data.clone());
                    fields.insert("status".into(), json!(status));
                },
                ActionKind::Error(info) => {
                    fields.insert("error".into(), info.payload());
                    if let Some(status) = info.status() {
                        fields.insert("status".into(), json!(status));
                    }
                },
                ActionKind::Reset => {},
            }
        }
        wire
    }
}

/// Builds the four lifecycle actions for one endpoint.
#[derive(Debug, Clone)]
pub struct ActionFactory {
    endpoint: EndpointId,
}

impl ActionFactory {
    /// Factory for `endpoint`
    #[must_use]
    pub const fn new(endpoint: EndpointId) -> Self {
        Self { endpoint }
    }

    /// Endpoint this factory tags actions with
    #[must_use]
    pub const fn endpoint(&self) -> &EndpointId {
        &self.endpoint
    }

    fn build(&self, kind: ActionKind, args: Args) -> EndpointAction {
        EndpointAction {
            endpoint: self.endpoint.clone(),
            args,
            kind,
        }
    }

    /// `request` action
    #[must_use]
    pub fn request(&self, method: Method, args: Args) -> EndpointAction {
        self.build(ActionKind::Request { method }, args)
    }

    /// `success` action
    #[must_use]
    pub fn success(&self, data: Value, status: u16, args: Args) -> EndpointAction {
        self.build(ActionKind::Success { data, status }, args)
    }

    /// `error` action
    #[must_use]
    pub fn error(&self, error: ErrorInfo, args: Args) -> EndpointAction {
        self.build(ActionKind::Error(error), args)
    }

    /// `reset` action
    #[must_use]
    pub fn reset(&self, args: Args) -> EndpointAction {
        self.build(ActionKind::Reset, args)
    }

    /// Wire type string for `phase`.
    #[must_use]
    pub fn type_of(&self, phase: Phase) -> String {
        format!("{}_{phase}", self.endpoint)
    }

    /// Whether a wire type string belongs to this endpoint.
    #[must_use]
    pub fn is_own_type(&self, candidate: &str) -> bool {
        candidate
            .strip_prefix(&self.endpoint.prefix())
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|phase| {
                matches!(phase, "request" | "success" | "error" | "reset")
            })
    }
}
