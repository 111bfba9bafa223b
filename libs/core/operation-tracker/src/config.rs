//! Tracker configuration
//!
//! `TrackerConfig` is handed to every tracker at construction. There is no
//! ambient default shared between trackers, so tests can run side by side
//! with different intervals.

use core_config::{ConfigError, FromEnv, env_duration_ms, env_duration_secs};
use std::time::Duration;

/// Default delay between two status fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default deadline for `wait_for_completion`
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default deadline for `cancel_and_wait`
pub const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for operation trackers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Delay between background status fetches; also the granularity at
    /// which waiters re-check the current snapshot
    pub poll_interval: Duration,

    /// Deadline used by `wait_for_completion` when the caller passes none
    pub default_timeout: Duration,

    /// Deadline used by `cancel_and_wait` when the caller passes none
    pub cancel_timeout: Duration,
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the poll interval (clamped to at least 1ms)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the completion timeout
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the cancel-and-wait timeout
    pub fn with_cancel_timeout(mut self, timeout: Duration) -> Self {
        self.cancel_timeout = timeout;
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            default_timeout: DEFAULT_TIMEOUT,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
        }
    }
}

impl FromEnv for TrackerConfig {
    /// Reads from environment variables, falling back to the defaults:
    /// - TRACKER_POLL_INTERVAL_MS: defaults to 500
    /// - TRACKER_TIMEOUT_SECS: defaults to 600
    /// - TRACKER_CANCEL_TIMEOUT_SECS: defaults to 30
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default()
            .with_poll_interval(env_duration_ms(
                "TRACKER_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL,
            )?)
            .with_default_timeout(env_duration_secs("TRACKER_TIMEOUT_SECS", DEFAULT_TIMEOUT)?)
            .with_cancel_timeout(env_duration_secs(
                "TRACKER_CANCEL_TIMEOUT_SECS",
                DEFAULT_CANCEL_TIMEOUT,
            )?);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.default_timeout, Duration::from_secs(600));
        assert!(config.cancel_timeout < config.default_timeout);
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrackerConfig::new()
            .with_poll_interval(Duration::from_millis(20))
            .with_default_timeout(Duration::from_secs(5))
            .with_cancel_timeout(Duration::from_secs(1));

        assert_eq!(config.poll_interval, Duration::from_millis(20));
        assert_eq!(config.default_timeout, Duration::from_secs(5));
        assert_eq!(config.cancel_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let config = TrackerConfig::new().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn test_from_env_with_defaults() {
        temp_env::with_vars(
            [
                ("TRACKER_POLL_INTERVAL_MS", None::<&str>),
                ("TRACKER_TIMEOUT_SECS", None::<&str>),
                ("TRACKER_CANCEL_TIMEOUT_SECS", None::<&str>),
            ],
            || {
                let config = TrackerConfig::from_env().unwrap();
                assert_eq!(config, TrackerConfig::default());
            },
        );
    }

    #[test]
    fn test_from_env_with_custom_values() {
        temp_env::with_vars(
            [
                ("TRACKER_POLL_INTERVAL_MS", Some("100")),
                ("TRACKER_TIMEOUT_SECS", Some("60")),
                ("TRACKER_CANCEL_TIMEOUT_SECS", Some("5")),
            ],
            || {
                let config = TrackerConfig::from_env().unwrap();
                assert_eq!(config.poll_interval, Duration::from_millis(100));
                assert_eq!(config.default_timeout, Duration::from_secs(60));
                assert_eq!(config.cancel_timeout, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn test_from_env_invalid_value() {
        temp_env::with_var("TRACKER_TIMEOUT_SECS", Some("forever"), || {
            let err = TrackerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("TRACKER_TIMEOUT_SECS"));
        });
    }
}
