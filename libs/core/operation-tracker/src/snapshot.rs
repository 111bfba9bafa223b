//! Point-in-time status records and the terminal classifier.
//!
//! Every job kind has its own state set, but they all collapse onto the same
//! four [`OperationPhase`]s. The tracker only ever reasons about phases.

use std::fmt::Debug;

/// Lifecycle phase of a remote operation.
///
/// `Running` covers every non-terminal server state. The other three are
/// terminal: the server guarantees no further transition once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationPhase {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl OperationPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationPhase::Running)
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, OperationPhase::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OperationPhase::Failed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationPhase::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationPhase::Running => "running",
            OperationPhase::Succeeded => "succeeded",
            OperationPhase::Failed => "failed",
            OperationPhase::Cancelled => "cancelled",
        }
    }
}

/// Immutable status record returned by the server.
///
/// Implementors are plain values. The tracker never mutates a snapshot; it
/// swaps the whole value whenever a fresher one arrives.
pub trait OperationSnapshot: Clone + Debug + Send + Sync + 'static {
    /// Job kind, used as the metrics label
    const KIND: &'static str = "operation";

    /// Server-side id of the operation
    fn operation_id(&self) -> String;

    /// Phase of the snapshot's state, as decided by the job kind's classifier
    fn phase(&self) -> OperationPhase;

    /// Server state name, used in logs and timeout errors
    fn state_name(&self) -> String;

    fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }
}
