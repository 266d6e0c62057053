//! The transport seam.
//!
//! The coordinator never talks to the network itself; it hands a resolved
//! [`HttpRequest`] and a [`CancelSignal`] to an [`HttpClient`]. Production
//! code uses [`ReqwestClient`](crate::reqwest_client::ReqwestClient), tests a
//! scripted mock.

use crate::error::HttpError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use super_api_core::{Method, RequestOptions};
use tokio::sync::watch;

/// A fully resolved call.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP verb
    pub method: Method,
    /// URL after template resolution
    pub url: String,
    /// Request body
    pub payload: Option<Value>,
    /// Merged options (caller over defaults)
    pub options: RequestOptions,
}

/// A 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded body
    pub data: Value,
}

/// Abort signal for one in-flight call.
///
/// Cancellation is advisory: the coordinator stops waiting on the call as
/// soon as the signal fires, and a transport may also watch it to release
/// resources early.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a signal and the sender that triggers it.
    #[must_use]
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A signal that never fires.
    #[must_use]
    pub fn never() -> Self {
        Self::channel().1
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested.
    ///
    /// Never resolves if the trigger is dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !fired {
            std::future::pending::<()>().await;
        }
    }
}

/// HTTP transport capability.
///
/// Implementations resolve with the response on 2xx, and reject with
/// [`HttpError::Response`] for other statuses or [`HttpError::Transport`]
/// when the call could not complete.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform one call.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] for non-2xx responses, transport failures and
    /// cancellation.
    async fn request(
        &self,
        request: HttpRequest,
        cancel: CancelSignal,
    ) -> Result<HttpResponse, HttpError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn request(
        &self,
        request: HttpRequest,
        cancel: CancelSignal,
    ) -> Result<HttpResponse, HttpError> {
        (**self).request(request, cancel).await
    }
}
