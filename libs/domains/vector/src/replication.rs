//! Shard replication jobs.
//!
//! A COPY runs `REGISTERED -> HYDRATING -> FINALIZING -> READY`; a MOVE also
//! passes through `DEHYDRATING` before `READY`. Any state may end in
//! `CANCELLED`. `READY` stays successful even when errors were recorded on
//! the way.

use chrono::{DateTime, Utc};
use operation_tracker::{OperationPhase, OperationSnapshot, OperationTracker};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::{VectorError, VectorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplicationState {
    Registered,
    Hydrating,
    Finalizing,
    Dehydrating,
    Ready,
    Cancelled,
}

impl ReplicationState {
    pub fn phase(&self) -> OperationPhase {
        match self {
            ReplicationState::Registered
            | ReplicationState::Hydrating
            | ReplicationState::Finalizing
            | ReplicationState::Dehydrating => OperationPhase::Running,
            ReplicationState::Ready => OperationPhase::Succeeded,
            ReplicationState::Cancelled => OperationPhase::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }
}

/// Whether the source replica is kept (COPY) or removed (MOVE)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum TransferType {
    #[default]
    Copy,
    Move,
}

/// State plus the errors accumulated so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationStatus {
    pub state: ReplicationState,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Status record of a replication run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSnapshot {
    pub id: Uuid,
    pub collection: String,
    #[serde(rename = "shardId")]
    pub shard: String,
    #[serde(rename = "sourceNodeId")]
    pub source_node: String,
    #[serde(rename = "targetNodeId")]
    pub target_node: String,
    #[serde(rename = "type", default)]
    pub transfer_type: TransferType,
    pub status: ReplicationStatus,
    #[serde(default)]
    pub scheduled_for_cancel: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReplicationSnapshot {
    pub fn state(&self) -> ReplicationState {
        self.status.state
    }

    pub fn errors(&self) -> &[String] {
        &self.status.errors
    }
}

impl OperationSnapshot for ReplicationSnapshot {
    const KIND: &'static str = "replication";

    fn operation_id(&self) -> String {
        self.id.to_string()
    }

    fn phase(&self) -> OperationPhase {
        self.status.state.phase()
    }

    fn state_name(&self) -> String {
        self.status.state.to_string()
    }
}

/// Tracker over a replication run
pub type ReplicationTracker = OperationTracker<ReplicationSnapshot>;

/// Request to copy or move one shard replica between nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicateRequest {
    pub collection: String,
    pub shard: String,
    pub source_node: String,
    pub target_node: String,
    #[serde(rename = "type")]
    pub transfer_type: TransferType,
}

impl ReplicateRequest {
    pub fn new(
        collection: impl Into<String>,
        shard: impl Into<String>,
        source_node: impl Into<String>,
        target_node: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            shard: shard.into(),
            source_node: source_node.into(),
            target_node: target_node.into(),
            transfer_type: TransferType::Copy,
        }
    }

    pub fn with_transfer_type(mut self, transfer_type: TransferType) -> Self {
        self.transfer_type = transfer_type;
        self
    }

    pub fn validate(&self) -> VectorResult<()> {
        let fields = [
            ("collection", &self.collection),
            ("shard", &self.shard),
            ("source node", &self.source_node),
            ("target node", &self.target_node),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(VectorError::Validation(format!("{} must not be empty", name)));
        }
        if self.source_node == self.target_node {
            return Err(VectorError::Validation(format!(
                "source and target node are both {}",
                self.source_node
            )));
        }
        Ok(())
    }
}
