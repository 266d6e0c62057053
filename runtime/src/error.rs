//! Error types for the endpoint runtime.

use serde_json::Value;
use super_api_core::ErrorInfo;
use thiserror::Error;

/// Failure reported by an [`HttpClient`](crate::http::HttpClient).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpError {
    /// The remote answered with a non-2xx status
    #[error("HTTP {status}")]
    Response {
        /// HTTP status code
        status: u16,
        /// Response body (JSON, or a JSON string when the body was not JSON)
        body: Value,
    },

    /// The call never completed
    #[error("{message}")]
    Transport {
        /// What went wrong
        message: String,
    },

    /// The call was aborted through its cancel signal
    #[error("request cancelled")]
    Cancelled,
}

impl HttpError {
    /// Transport failure with a message
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Status code of a response error
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Cancelled => None,
        }
    }
}

impl From<&HttpError> for ErrorInfo {
    fn from(error: &HttpError) -> Self {
        match error {
            HttpError::Response { status, body } => Self::Response {
                status: *status,
                body: body.clone(),
            },
            HttpError::Transport { message } => Self::Transport {
                message: message.clone(),
            },
            HttpError::Cancelled => Self::Transport {
                message: error.to_string(),
            },
        }
    }
}

/// Failure of an [`EventSink`](crate::sink::EventSink) while delivering an action.
///
/// These are consumer-side errors. They are passed through to the caller
/// and never turned into an endpoint `error` action.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A listener reacting to the action failed
    #[error("action listener failed: {0}")]
    Listener(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The sink no longer accepts actions
    #[error("event sink is closed")]
    Closed,
}

/// Error returned by endpoint operations.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The call failed; an `error` action was emitted first
    #[error("request failed: {0}")]
    Http(#[source] HttpError),

    /// The call was aborted by an explicit cancel; an `error` action was emitted first
    #[error("request cancelled")]
    Cancelled,

    /// A newer call for the same key replaced this one; nothing was emitted
    #[error("request superseded by a newer call for the same key")]
    Superseded,

    /// Delivering an action to the sink failed
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl RequestError {
    /// The transport error, if the call itself failed
    #[must_use]
    pub const fn http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(error) => Some(error),
            _ => None,
        }
    }
}

/// Errors building an endpoint registry or loading its configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Two endpoints share a name
    #[error("duplicate endpoint name: {0}")]
    DuplicateEndpoint(String),

    /// No endpoint has this name
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// An endpoint name cannot be used
    #[error("invalid endpoint name: {0:?}")]
    InvalidName(String),

    /// Configuration text could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
