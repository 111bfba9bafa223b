//! Adapters binding one remote job to its transport.

use std::sync::Arc;

use async_trait::async_trait;
use operation_tracker::{BoxError, OperationSource};
use uuid::Uuid;

use crate::api::{BackupApi, ReplicationApi};
use crate::backup::{BackupKind, BackupSnapshot};
use crate::error::VectorResult;
use crate::replication::ReplicationSnapshot;

/// Status source for one backup or restore run.
///
/// Status is read from the backup or restore endpoint depending on `kind`.
/// The server has a single cancel endpoint for both directions.
pub struct BackupStatusSource<A: BackupApi> {
    api: Arc<A>,
    backend: String,
    id: String,
    kind: BackupKind,
}

impl<A: BackupApi> BackupStatusSource<A> {
    pub fn new(
        api: Arc<A>,
        backend: impl Into<String>,
        id: impl Into<String>,
        kind: BackupKind,
    ) -> Self {
        Self {
            api,
            backend: backend.into(),
            id: id.into(),
            kind,
        }
    }

    pub(crate) async fn fetch(&self) -> VectorResult<BackupSnapshot> {
        let snapshot = match self.kind {
            BackupKind::Create => self.api.backup_status(&self.backend, &self.id).await?,
            BackupKind::Restore => self.api.restore_status(&self.backend, &self.id).await?,
        };
        Ok(snapshot.with_kind(self.kind))
    }
}

#[async_trait]
impl<A: BackupApi> OperationSource<BackupSnapshot> for BackupStatusSource<A> {
    async fn fetch_status(&self) -> Result<BackupSnapshot, BoxError> {
        self.fetch().await.map_err(Into::into)
    }

    async fn request_cancel(&self) -> Result<(), BoxError> {
        self.api
            .cancel_backup(&self.backend, &self.id)
            .await
            .map_err(Into::into)
    }
}

/// Status source for one replication run
pub struct ReplicationStatusSource<A: ReplicationApi> {
    api: Arc<A>,
    id: Uuid,
}

impl<A: ReplicationApi> ReplicationStatusSource<A> {
    pub fn new(api: Arc<A>, id: Uuid) -> Self {
        Self { api, id }
    }
}

#[async_trait]
impl<A: ReplicationApi> OperationSource<ReplicationSnapshot> for ReplicationStatusSource<A> {
    async fn fetch_status(&self) -> Result<ReplicationSnapshot, BoxError> {
        self.api
            .replication_status(self.id)
            .await
            .map_err(Into::into)
    }

    async fn request_cancel(&self) -> Result<(), BoxError> {
        self.api
            .cancel_replication(self.id)
            .await
            .map_err(Into::into)
    }
}
