use async_trait::async_trait;
use uuid::Uuid;

use crate::backup::{BackupSnapshot, CreateBackup, RestoreBackup};
use crate::error::VectorResult;
use crate::replication::{ReplicateRequest, ReplicationSnapshot};

/// Transport for backup and restore endpoints
///
/// Implemented by the REST/gRPC client. A missing job is reported as
/// `VectorError::NotFound`; connection problems as `VectorError::Transport`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackupApi: Send + Sync {
    /// Start a backup and return its first status record
    async fn create_backup(&self, request: CreateBackup) -> VectorResult<BackupSnapshot>;

    /// Status of a backup run
    async fn backup_status(&self, backend: &str, id: &str) -> VectorResult<BackupSnapshot>;

    /// Ask the server to cancel a backup run
    async fn cancel_backup(&self, backend: &str, id: &str) -> VectorResult<()>;

    /// Start restoring a backup and return its first status record
    async fn restore_backup(&self, request: RestoreBackup) -> VectorResult<BackupSnapshot>;

    /// Status of a restore run
    async fn restore_status(&self, backend: &str, id: &str) -> VectorResult<BackupSnapshot>;
}

/// Transport for shard replication endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReplicationApi: Send + Sync {
    /// Register a replication and return its first status record
    async fn replicate(&self, request: ReplicateRequest) -> VectorResult<ReplicationSnapshot>;

    async fn replication_status(&self, id: Uuid) -> VectorResult<ReplicationSnapshot>;

    async fn cancel_replication(&self, id: Uuid) -> VectorResult<()>;
}
