use operation_tracker::TrackerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl VectorError {
    /// Whether the error came from the tracker's deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, VectorError::Tracker(err) if err.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_tracker_errors_convert() {
        let err: VectorError = TrackerError::Timeout {
            operation_id: "nightly".to_string(),
            last_state: "TRANSFERRING".to_string(),
            waited: Duration::from_secs(1),
        }
        .into();

        assert!(err.is_timeout());
        assert!(err.to_string().contains("nightly"));
    }

    #[test]
    fn test_validation_is_not_timeout() {
        let err = VectorError::Validation("backup id must not be empty".to_string());
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "Invalid input: backup id must not be empty");
    }
}
