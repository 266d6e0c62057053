//! Where lifecycle actions go.

use crate::error::DispatchError;
use std::sync::Arc;
use super_api_core::EndpointAction;

/// Receives every lifecycle action an endpoint emits.
///
/// Dispatch is synchronous: when it returns, the action has been applied, so
/// observers see the `request` state before the transport call starts.
pub trait EventSink: Send + Sync {
    /// Deliver one action.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the sink or one of its observers fails.
    /// Endpoints pass this error through to their caller unchanged.
    fn dispatch(&self, action: EndpointAction) -> Result<(), DispatchError>;
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn dispatch(&self, action: EndpointAction) -> Result<(), DispatchError> {
        (**self).dispatch(action)
    }
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn dispatch(&self, action: EndpointAction) -> Result<(), DispatchError> {
        (**self).dispatch(action)
    }
}
