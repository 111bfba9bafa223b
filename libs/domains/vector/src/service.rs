use std::sync::Arc;
use std::time::Duration;

use operation_tracker::{OperationTracker, TrackerConfig};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::{BackupApi, ReplicationApi};
use crate::backup::{
    BackupKind, BackupSnapshot, BackupTracker, CreateBackup, RestoreBackup, validate_target,
};
use crate::error::{VectorError, VectorResult};
use crate::replication::{ReplicateRequest, ReplicationSnapshot, ReplicationTracker};
use crate::source::{BackupStatusSource, ReplicationStatusSource};

/// Backup and restore operations
///
/// Every start operation returns a running [`BackupTracker`]; the `*_and_wait`
/// variants block until the job is terminal and dispose their tracker.
pub struct BackupService<A: BackupApi + 'static> {
    api: Arc<A>,
    config: TrackerConfig,
}

impl<A: BackupApi + 'static> BackupService<A> {
    pub fn new(api: A) -> Self {
        Self::from_arc(Arc::new(api))
    }

    pub fn from_arc(api: Arc<A>) -> Self {
        Self {
            api,
            config: TrackerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[instrument(skip(self, request), fields(backup_id = %request.id, backend = %request.backend))]
    pub async fn create(&self, request: CreateBackup) -> VectorResult<BackupTracker> {
        request.validate()?;

        let initial = self
            .api
            .create_backup(request)
            .await?
            .with_kind(BackupKind::Create);
        info!(state = %initial.status, "Backup started");

        Ok(self.tracker(initial))
    }

    /// Start a backup and wait until it is terminal.
    ///
    /// Returns the final snapshot whatever its outcome; a failed backup is
    /// not an error. `timeout` defaults to the configured `default_timeout`.
    pub async fn create_and_wait(
        &self,
        request: CreateBackup,
        timeout: Option<Duration>,
    ) -> VectorResult<BackupSnapshot> {
        let tracker = self.create(request).await?;
        wait_and_dispose(tracker, timeout).await
    }

    #[instrument(skip(self, request), fields(backup_id = %request.id, backend = %request.backend))]
    pub async fn restore(&self, request: RestoreBackup) -> VectorResult<BackupTracker> {
        request.validate()?;

        let initial = self
            .api
            .restore_backup(request)
            .await?
            .with_kind(BackupKind::Restore);
        info!(state = %initial.status, "Restore started");

        Ok(self.tracker(initial))
    }

    pub async fn restore_and_wait(
        &self,
        request: RestoreBackup,
        timeout: Option<Duration>,
    ) -> VectorResult<BackupSnapshot> {
        let tracker = self.restore(request).await?;
        wait_and_dispose(tracker, timeout).await
    }

    /// Attach a tracker to a backup started elsewhere
    pub async fn track_backup(&self, backend: &str, id: &str) -> VectorResult<BackupTracker> {
        self.attach(backend, id, BackupKind::Create).await
    }

    /// Attach a tracker to a restore started elsewhere
    pub async fn track_restore(&self, backend: &str, id: &str) -> VectorResult<BackupTracker> {
        self.attach(backend, id, BackupKind::Restore).await
    }

    #[instrument(skip(self))]
    async fn attach(
        &self,
        backend: &str,
        id: &str,
        kind: BackupKind,
    ) -> VectorResult<BackupTracker> {
        validate_target(id, backend)?;

        let source = BackupStatusSource::new(Arc::clone(&self.api), backend, id, kind);
        let initial = source.fetch().await?;

        let config = self.config.clone();
        Ok(OperationTracker::start(initial, Arc::new(source), config))
    }

    /// Track a job the server just accepted, polling it under the id and
    /// backend the server reported
    fn tracker(&self, initial: BackupSnapshot) -> BackupTracker {
        let source = BackupStatusSource::new(
            Arc::clone(&self.api),
            initial.backend.clone(),
            initial.id.clone(),
            initial.kind,
        );
        OperationTracker::start(initial, Arc::new(source), self.config.clone())
    }
}

/// Shard replication operations
pub struct ReplicationService<A: ReplicationApi + 'static> {
    api: Arc<A>,
    config: TrackerConfig,
}

impl<A: ReplicationApi + 'static> ReplicationService<A> {
    pub fn new(api: A) -> Self {
        Self::from_arc(Arc::new(api))
    }

    pub fn from_arc(api: Arc<A>) -> Self {
        Self {
            api,
            config: TrackerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[instrument(skip(self, request), fields(
        collection = %request.collection,
        shard = %request.shard,
        transfer_type = %request.transfer_type,
    ))]
    pub async fn replicate(&self, request: ReplicateRequest) -> VectorResult<ReplicationTracker> {
        request.validate()?;

        let initial = self.api.replicate(request).await?;
        info!(replication_id = %initial.id, state = %initial.state(), "Replication registered");

        let source = ReplicationStatusSource::new(Arc::clone(&self.api), initial.id);
        let config = self.config.clone();
        Ok(OperationTracker::start(initial, Arc::new(source), config))
    }

    pub async fn replicate_and_wait(
        &self,
        request: ReplicateRequest,
        timeout: Option<Duration>,
    ) -> VectorResult<ReplicationSnapshot> {
        let tracker = self.replicate(request).await?;
        wait_and_dispose(tracker, timeout).await
    }

    /// Attach a tracker to a replication registered elsewhere
    #[instrument(skip(self))]
    pub async fn track(&self, id: Uuid) -> VectorResult<ReplicationTracker> {
        if id.is_nil() {
            return Err(VectorError::Validation(
                "replication id must not be nil".to_string(),
            ));
        }

        let initial = self.api.replication_status(id).await?;
        let source = ReplicationStatusSource::new(Arc::clone(&self.api), id);
        let config = self.config.clone();
        Ok(OperationTracker::start(initial, Arc::new(source), config))
    }
}

async fn wait_and_dispose<S: operation_tracker::OperationSnapshot>(
    tracker: OperationTracker<S>,
    timeout: Option<Duration>,
) -> VectorResult<S> {
    let outcome = tracker.wait_for_completion(timeout, None).await;
    tracker.dispose_async().await;
    Ok(outcome?.as_ref().clone())
}
