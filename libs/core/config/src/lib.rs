//! Environment-driven configuration helpers shared by the client crates.
//!
//! Settings are always materialised into explicit values and handed to the
//! components that need them; nothing here keeps process-wide mutable state.

pub mod tracing;

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Read a variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a variable that must be present
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable into `T`, returning `default` when it is unset.
///
/// A variable that is set but does not parse is an error rather than a
/// silent fallback.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::ParseError {
                key: key.to_string(),
                details: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

/// Parse a millisecond count into a [`Duration`]
pub fn env_duration_ms(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    let millis = env_parse(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

/// Parse a second count into a [`Duration`]
pub fn env_duration_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    let secs = env_parse(key, default.as_secs())?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_default_with_value() {
        temp_env::with_var("TEST_VAR", Some("test_value"), || {
            assert_eq!(env_or_default("TEST_VAR", "default"), "test_value");
        });
    }

    #[test]
    fn test_env_or_default_without_value() {
        temp_env::with_var_unset("MISSING_VAR", || {
            assert_eq!(
                env_or_default("MISSING_VAR", "default_value"),
                "default_value"
            );
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("MISSING_REQUIRED", || {
            let err = env_required("MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_parse_uses_default_when_unset() {
        temp_env::with_var_unset("PARSE_UNSET", || {
            let value: u32 = env_parse("PARSE_UNSET", 7).unwrap();
            assert_eq!(value, 7);
        });
    }

    #[test]
    fn test_env_parse_trims_whitespace() {
        temp_env::with_var("PARSE_PADDED", Some(" 42 "), || {
            let value: u32 = env_parse("PARSE_PADDED", 0).unwrap();
            assert_eq!(value, 42);
        });
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        temp_env::with_var("PARSE_BAD", Some("soon"), || {
            let err = env_parse::<u64>("PARSE_BAD", 1).unwrap_err();
            match err {
                ConfigError::ParseError { key, .. } => assert_eq!(key, "PARSE_BAD"),
                other => panic!("unexpected error: {other:?}"),
            }
        });
    }

    #[test]
    fn test_env_durations() {
        temp_env::with_vars(
            [("DUR_MS", Some("250")), ("DUR_SECS", None::<&str>)],
            || {
                let ms = env_duration_ms("DUR_MS", Duration::from_millis(1)).unwrap();
                let secs = env_duration_secs("DUR_SECS", Duration::from_secs(9)).unwrap();
                assert_eq!(ms, Duration::from_millis(250));
                assert_eq!(secs, Duration::from_secs(9));
            },
        );
    }
}
