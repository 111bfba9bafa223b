//! Tracker error types
//!
//! Only explicit calls (`refresh_status`, `cancel`, `wait_for_completion`)
//! return these. Failures inside the background polling loop are logged and
//! retried on the next tick instead.

use std::time::Duration;
use thiserror::Error;

/// Boxed error produced by a status source (the transport layer)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors surfaced by an [`OperationTracker`](crate::OperationTracker)
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The status fetch issued by an explicit refresh failed
    #[error("Failed to fetch status of operation {operation_id}: {source}")]
    StatusFetch {
        operation_id: String,
        #[source]
        source: BoxError,
    },

    /// The cancel request could not be delivered
    #[error("Failed to request cancellation of operation {operation_id}: {source}")]
    CancelRequest {
        operation_id: String,
        #[source]
        source: BoxError,
    },

    /// The operation did not reach a terminal state before the deadline
    #[error("Operation {operation_id} still {last_state} after {waited:?}")]
    Timeout {
        operation_id: String,
        last_state: String,
        waited: Duration,
    },

    /// The caller's cancel signal fired before the call finished
    #[error("Call on operation {operation_id} was interrupted by the caller")]
    Interrupted { operation_id: String },

    /// The tracker was disposed before the operation finished
    #[error("Tracker for operation {operation_id} has been disposed")]
    Disposed { operation_id: String },
}

impl TrackerError {
    /// Whether this is a deadline failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrackerError::Timeout { .. })
    }

    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TrackerError::StatusFetch { .. } | TrackerError::CancelRequest { .. }
        )
    }

    /// Id of the operation the error refers to
    pub fn operation_id(&self) -> &str {
        match self {
            TrackerError::StatusFetch { operation_id, .. }
            | TrackerError::CancelRequest { operation_id, .. }
            | TrackerError::Timeout { operation_id, .. }
            | TrackerError::Interrupted { operation_id }
            | TrackerError::Disposed { operation_id } => operation_id,
        }
    }
}
