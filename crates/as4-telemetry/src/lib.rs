//! # AS4 Telemetry
//!
//! Logging and metrics for the AS4 exchange crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use as4_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // Logs and metrics are now being collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AS4_SERVICE_NAME` | `as4-exchange` | Service name in the startup log |
//! | `AS4_LOG_LEVEL` | `RUST_LOG`, then `info` | Log filter |
//! | `AS4_JSON_LOGS` | `true` in containers | JSON log lines |
//! | `AS4_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, DECODE_FAILURES, EXCHANGES_STARTED,
    EXCHANGE_DURATION, EXCHANGE_OUTCOMES, HANDLER_FAILURES, INBOUND_MESSAGES_DELIVERED,
    NOTIFICATIONS_FULFILLED, PENDING_CORRELATIONS, SWEEP_REMOVALS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install log subscriber: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)
}
