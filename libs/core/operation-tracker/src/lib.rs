//! Operation Tracker
//!
//! Client-side supervision of long-running server operations (backups,
//! restores, shard replication, ...).
//!
//! ## Features
//!
//! - **Generic tracker**: `OperationTracker<S>` works for any snapshot type
//!   implementing `OperationSnapshot`
//! - **Background polling**: one Tokio task per tracker, stopped the moment
//!   the operation becomes terminal
//! - **Best-effort polling**: fetch failures in the background are retried
//!   on the next tick, never surfaced
//! - **Timeouts and cancellation**: `wait_for_completion`, `cancel`,
//!   `cancel_and_wait` with caller-supplied `CancelSignal`s
//! - **Deterministic teardown**: resources released exactly once, on
//!   terminal snapshot, `dispose`, `dispose_async` or drop
//! - **Prometheus metrics**: poll outcomes, teardowns, cancel requests
//!
//! ## Example
//!
//! ```ignore
//! use operation_tracker::{OperationTracker, TrackerConfig};
//!
//! let initial = client.start_backup(request).await?;
//! let tracker = OperationTracker::start(initial, source, TrackerConfig::default());
//!
//! let finished = tracker.wait_for_completion(None, None).await?;
//! assert!(finished.phase().is_terminal());
//! ```

mod config;
mod error;
pub mod metrics;
mod signal;
mod snapshot;
mod source;
mod tracker;

// Re-export main types
pub use self::metrics::{TrackerMetrics, init_metrics, render_metrics};
pub use config::{DEFAULT_CANCEL_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, TrackerConfig};
pub use error::{BoxError, TrackerError, TrackerResult};
pub use signal::{CancelSignal, CancelTrigger};
pub use snapshot::{OperationPhase, OperationSnapshot};
pub use source::{FnSource, OperationSource};
pub use tracker::OperationTracker;
