//! Vector Domain Library
//!
//! Long-running server jobs of the vector database (backups, restores and
//! shard replication) exposed as trackable operations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ BackupService                │  ← validation, start / start-and-wait
//! │ ReplicationService           │
//! └──────────────┬───────────────┘
//!                │ returns
//! ┌──────────────▼───────────────┐     ┌──────────────────────────┐
//! │ OperationTracker<S>          │────►│ BackupStatusSource       │
//! │ (operation-tracker crate)    │     │ ReplicationStatusSource  │
//! └──────────────────────────────┘     └────────────┬─────────────┘
//!                                                   │
//!                                      ┌────────────▼─────────────┐
//!                                      │ BackupApi / ReplicationApi│
//!                                      │ (transport, traits)      │
//!                                      └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_vector::{BackupService, CreateBackup};
//! use operation_tracker::TrackerConfig;
//!
//! let service = BackupService::new(client).with_config(TrackerConfig::from_env()?);
//!
//! let tracker = service.create(CreateBackup::new("nightly", "s3")).await?;
//! let finished = tracker.wait_for_completion(None, None).await?;
//! println!("backup finished as {}", finished.status);
//! ```

pub mod api;
pub mod backup;
pub mod error;
pub mod replication;
pub mod service;
pub mod source;

// Re-export commonly used types
pub use api::{BackupApi, ReplicationApi};
pub use backup::{
    BackupKind, BackupSnapshot, BackupStatus, BackupTracker, CreateBackup, RestoreBackup,
};
pub use error::{VectorError, VectorResult};
pub use replication::{
    ReplicateRequest, ReplicationSnapshot, ReplicationState, ReplicationStatus,
    ReplicationTracker, TransferType,
};
pub use service::{BackupService, ReplicationService};
pub use source::{BackupStatusSource, ReplicationStatusSource};
