//! Backup and restore jobs.

use chrono::{DateTime, Utc};
use operation_tracker::{OperationPhase, OperationSnapshot, OperationTracker};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{VectorError, VectorResult};

/// Server-side state of a backup or restore run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupStatus {
    Started,
    Transferring,
    Success,
    Failed,
    #[serde(rename = "CANCELED", alias = "CANCELLED")]
    #[strum(to_string = "CANCELED", serialize = "CANCELLED")]
    Cancelled,
}

impl BackupStatus {
    pub fn phase(&self) -> OperationPhase {
        match self {
            BackupStatus::Started | BackupStatus::Transferring => OperationPhase::Running,
            BackupStatus::Success => OperationPhase::Succeeded,
            BackupStatus::Failed => OperationPhase::Failed,
            BackupStatus::Cancelled => OperationPhase::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }
}

/// Direction of a backup job
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackupKind {
    #[default]
    Create,
    Restore,
}

/// Status record of a backup or restore run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub id: String,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, alias = "classes")]
    pub collections: Vec<String>,
    /// Not part of the server payload; stamped by the status source
    #[serde(skip)]
    pub kind: BackupKind,
    pub status: BackupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl BackupSnapshot {
    pub fn new(
        id: impl Into<String>,
        backend: impl Into<String>,
        kind: BackupKind,
        status: BackupStatus,
    ) -> Self {
        Self {
            id: id.into(),
            backend: backend.into(),
            path: None,
            collections: Vec::new(),
            kind,
            status,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn with_kind(mut self, kind: BackupKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_collections(mut self, collections: Vec<String>) -> Self {
        self.collections = collections;
        self
    }
}

impl OperationSnapshot for BackupSnapshot {
    const KIND: &'static str = "backup";

    fn operation_id(&self) -> String {
        self.id.clone()
    }

    fn phase(&self) -> OperationPhase {
        self.status.phase()
    }

    fn state_name(&self) -> String {
        self.status.to_string()
    }
}

/// Tracker over a backup or restore run
pub type BackupTracker = OperationTracker<BackupSnapshot>;

/// Request to start a backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackup {
    pub id: String,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_collections: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_collections: Vec<String>,
}

impl CreateBackup {
    pub fn new(id: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            backend: backend.into(),
            include_collections: Vec::new(),
            exclude_collections: Vec::new(),
        }
    }

    pub fn include(mut self, collections: Vec<String>) -> Self {
        self.include_collections = collections;
        self
    }

    pub fn exclude(mut self, collections: Vec<String>) -> Self {
        self.exclude_collections = collections;
        self
    }

    pub fn validate(&self) -> VectorResult<()> {
        validate_target(&self.id, &self.backend)?;
        validate_filters(&self.include_collections, &self.exclude_collections)
    }
}

/// Request to restore a finished backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreBackup {
    pub id: String,
    pub backend: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_collections: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_collections: Vec<String>,
}

impl RestoreBackup {
    pub fn new(id: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            backend: backend.into(),
            include_collections: Vec::new(),
            exclude_collections: Vec::new(),
        }
    }

    pub fn include(mut self, collections: Vec<String>) -> Self {
        self.include_collections = collections;
        self
    }

    pub fn exclude(mut self, collections: Vec<String>) -> Self {
        self.exclude_collections = collections;
        self
    }

    pub fn validate(&self) -> VectorResult<()> {
        validate_target(&self.id, &self.backend)?;
        validate_filters(&self.include_collections, &self.exclude_collections)
    }
}

pub(crate) fn validate_target(id: &str, backend: &str) -> VectorResult<()> {
    if id.trim().is_empty() {
        return Err(VectorError::Validation(
            "backup id must not be empty".to_string(),
        ));
    }
    if backend.trim().is_empty() {
        return Err(VectorError::Validation(
            "backup backend must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_filters(include: &[String], exclude: &[String]) -> VectorResult<()> {
    if !include.is_empty() && !exclude.is_empty() {
        return Err(VectorError::Validation(
            "include and exclude collection lists are mutually exclusive".to_string(),
        ));
    }
    if include.iter().chain(exclude).any(|c| c.trim().is_empty()) {
        return Err(VectorError::Validation(
            "collection names must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_backup_classifier() {
        assert_eq!(BackupStatus::Started.phase(), OperationPhase::Running);
        assert_eq!(BackupStatus::Transferring.phase(), OperationPhase::Running);
        assert_eq!(BackupStatus::Success.phase(), OperationPhase::Succeeded);
        assert_eq!(BackupStatus::Failed.phase(), OperationPhase::Failed);
        assert_eq!(BackupStatus::Cancelled.phase(), OperationPhase::Cancelled);

        assert!(!BackupStatus::Transferring.is_terminal());
        assert!(BackupStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_uses_server_spelling() {
        assert_eq!(BackupStatus::Cancelled.to_string(), "CANCELED");
        assert_eq!(BackupStatus::Transferring.to_string(), "TRANSFERRING");

        assert_eq!(
            BackupStatus::from_str("CANCELLED").unwrap(),
            BackupStatus::Cancelled
        );
        assert_eq!(
            BackupStatus::from_str("CANCELED").unwrap(),
            BackupStatus::Cancelled
        );
        assert!(BackupStatus::from_str("cancelled").is_err());
    }

    #[test]
    fn test_parse_server_payload() {
        let json = r#"{
            "id": "nightly",
            "backend": "s3",
            "path": "s3://backups/nightly",
            "classes": ["Article", "Author"],
            "status": "CANCELLED",
            "error": "stopped by operator",
            "startedAt": "2024-05-01T10:00:00Z",
            "completedAt": "2024-05-01T10:05:00Z"
        }"#;

        let snapshot: BackupSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.id, "nightly");
        assert_eq!(snapshot.collections, vec!["Article", "Author"]);
        assert_eq!(snapshot.kind, BackupKind::Create);
        assert_eq!(snapshot.status, BackupStatus::Cancelled);
        assert!(snapshot.phase().is_cancelled());
        assert!(snapshot.completed_at.is_some());

        let out = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(out["status"], "CANCELED");
        assert!(out.get("kind").is_none());
    }

    #[test]
    fn test_minimal_payload() {
        let json = r#"{"id": "b1", "backend": "filesystem", "status": "STARTED"}"#;
        let snapshot: BackupSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.state_name(), "STARTED");
        assert!(!snapshot.is_terminal());
        assert!(snapshot.error.is_none());
        assert!(snapshot.collections.is_empty());
    }

    #[test]
    fn test_request_validation() {
        assert!(CreateBackup::new("nightly", "s3").validate().is_ok());
        assert!(matches!(
            CreateBackup::new("", "s3").validate(),
            Err(VectorError::Validation(_))
        ));
        assert!(matches!(
            RestoreBackup::new("nightly", "  ").validate(),
            Err(VectorError::Validation(_))
        ));

        let both = CreateBackup::new("nightly", "s3")
            .include(vec!["Article".to_string()])
            .exclude(vec!["Author".to_string()]);
        assert!(both.validate().is_err());

        let blank = RestoreBackup::new("nightly", "s3").include(vec![String::new()]);
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = CreateBackup::new("nightly", "gcs").include(vec!["Article".to_string()]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["includeCollections"][0], "Article");
        assert!(json.get("excludeCollections").is_none());
    }
}
