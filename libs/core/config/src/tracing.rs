use crate::env_or_default;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Output format for log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// One JSON object per event, for log aggregation
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT` (`json` or anything else for pretty)
    pub fn from_env() -> Self {
        if env_or_default("LOG_FORMAT", "pretty").eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Initialize tracing with an env filter and span-trace capture.
///
/// `RUST_LOG` overrides the default filter, which keeps the client crates at
/// `debug` so tracker polling and teardown are visible while everything else
/// stays at `warn`.
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place (common in tests).
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,operation_tracker=debug,domain_vector=debug"));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init(),
    };

    match result {
        Ok(_) => info!(?format, "Tracing initialized"),
        Err(_) => debug!("Tracing already initialized, skipping re-initialization"),
    }
}
