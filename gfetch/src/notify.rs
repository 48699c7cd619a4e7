//! Request lifecycle notifications.

use http::Method;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Stage of a request when an event is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStatus {
    /// The request is about to be handed to the transport.
    Pending,
    /// A success response arrived, with its status.
    Succeeded(u16),
    /// The request failed, with the response status or 599.
    Failed(u16),
}

impl LifecycleStatus {
    /// Numeric form of the status; `0` while pending.
    pub fn code(&self) -> u16 {
        match self {
            Self::Pending => 0,
            Self::Succeeded(status) | Self::Failed(status) => *status,
        }
    }

    /// Check if the request has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Succeeded(status) => write!(f, "SUCCEEDED({})", status),
            Self::Failed(status) => write!(f, "FAILED({})", status),
        }
    }
}

/// Event passed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Raw name of the endpoint that issued the request.
    pub endpoint: String,
    /// HTTP method of the request.
    pub method: Method,
    /// Lifecycle stage.
    pub status: LifecycleStatus,
}

/// Observer invoked synchronously at each lifecycle transition.
///
/// Events from concurrent calls may interleave. Implementations cannot
/// influence the outcome of the request.
pub trait Notifier: Send + Sync {
    /// Receive a lifecycle event.
    fn notify(&self, event: &LifecycleEvent);
}

impl<F> Notifier for F
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    fn notify(&self, event: &LifecycleEvent) {
        self(event)
    }
}

/// Deliver an event, containing any panic raised by the notifier.
pub(crate) fn dispatch(notifier: &dyn Notifier, event: LifecycleEvent) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| notifier.notify(&event)));
    if result.is_err() {
        tracing::warn!(
            endpoint = %event.endpoint,
            method = %event.method,
            status = %event.status,
            "Notifier panicked; event dropped"
        );
    }
}

/// Notifier that records lifecycle events through `tracing`.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier {
    log_pending: bool,
}

impl TracingNotifier {
    /// Create a notifier that logs completed requests only.
    pub fn new() -> Self {
        Self { log_pending: false }
    }

    /// Also log requests as they are sent.
    pub fn with_pending(mut self) -> Self {
        self.log_pending = true;
        self
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, event: &LifecycleEvent) {
        match event.status {
            LifecycleStatus::Pending if self.log_pending => {
                tracing::debug!(
                    endpoint = %event.endpoint,
                    method = %event.method,
                    "Sending request"
                );
            }
            LifecycleStatus::Pending => {}
            LifecycleStatus::Succeeded(status) => {
                tracing::debug!(
                    endpoint = %event.endpoint,
                    method = %event.method,
                    status,
                    "Request succeeded"
                );
            }
            LifecycleStatus::Failed(status) => {
                tracing::warn!(
                    endpoint = %event.endpoint,
                    method = %event.method,
                    status,
                    "Request failed"
                );
            }
        }
    }
}
