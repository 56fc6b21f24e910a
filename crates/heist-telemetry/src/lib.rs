//! # Heist Telemetry
//!
//! Logging and metrics bootstrap for the vault heist coordinator.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter and a pretty or JSON layer
//! - **Metrics**: Prometheus counters, gauges and histograms in a global registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use heist_telemetry::{TelemetryConfig, init_telemetry};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `vault-heist` | Service name in logs |
//! | `HEIST_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honored) |
//! | `HEIST_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `HEIST_JSON_LOGS` | `false` | JSON log lines (default on in containers) |

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, ACTIONS_APPLIED, ACTIONS_REJECTED,
    ACTION_DURATION, GUARD_UPDATES, GUARD_UPDATES_SKIPPED, GUARD_UPDATE_DURATION,
    PERSIST_FAILURES, PUZZLES_SOLVED, SESSIONS_ACTIVE, SESSIONS_CREATED, SESSIONS_TERMINATED,
    SETTLEMENTS, SNAPSHOTS_PERSISTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    logging::init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
