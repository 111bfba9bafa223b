//! Prometheus metrics for operation trackers
//!
//! Every tracker records through the `metrics` facade. Nothing is exported
//! unless the host application installs a recorder, e.g. via [`init_metrics`].

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder.
///
/// Call this once at startup. Subsequent calls are no-ops. Returns `false`
/// when another recorder was already installed by the host application.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return true;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            info!("Prometheus metrics initialized");
            true
        }
        Err(e) => {
            warn!(error = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Render metrics in Prometheus format
pub fn render_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_default()
}

/// How a status fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Running,
    Terminal,
    Error,
}

impl PollOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            PollOutcome::Running => "running",
            PollOutcome::Terminal => "terminal",
            PollOutcome::Error => "error",
        }
    }
}

/// Tracker metrics helper, labelled by job kind
#[derive(Debug, Clone)]
pub struct TrackerMetrics {
    kind: String,
}

impl TrackerMetrics {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// A tracker started supervising an operation
    pub fn tracker_started(&self) {
        gauge!("operation_tracker_active", "kind" => self.kind.clone()).increment(1.0);
    }

    /// A tracker released its polling resources
    pub fn tracker_released(&self, phase: &str) {
        gauge!("operation_tracker_active", "kind" => self.kind.clone()).decrement(1.0);
        counter!(
            "operation_tracker_teardowns_total",
            "kind" => self.kind.clone(),
            "phase" => phase.to_string()
        )
        .increment(1);
    }

    /// A status fetch completed
    pub fn poll(&self, outcome: PollOutcome) {
        counter!(
            "operation_tracker_polls_total",
            "kind" => self.kind.clone(),
            "outcome" => outcome.as_str()
        )
        .increment(1);
    }

    /// A cancel request was sent to the server
    pub fn cancel_requested(&self) {
        counter!(
            "operation_tracker_cancel_requests_total",
            "kind" => self.kind.clone()
        )
        .increment(1);
    }

    /// A waiter gave up at its deadline
    pub fn wait_timed_out(&self) {
        counter!(
            "operation_tracker_wait_timeouts_total",
            "kind" => self.kind.clone()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = TrackerMetrics::new("backup");
        assert_eq!(metrics.kind(), "backup");
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        let metrics = TrackerMetrics::new("replication");
        metrics.tracker_started();
        metrics.poll(PollOutcome::Error);
        metrics.tracker_released("succeeded");
    }
}
