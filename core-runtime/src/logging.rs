//! Logging Initialization
//!
//! Sets up the global `tracing` subscriber. Token values never reach the
//! logs: token-bearing types redact themselves in their `Debug` output, and
//! call sites log statuses and reasons only.

use tracing_subscriber::EnvFilter;

use crate::error::{Result, RuntimeError};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output for development
    Pretty,
    /// Single-line output
    #[default]
    Compact,
    /// Structured JSON, one object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter directive string; `RUST_LOG` overrides it when set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter().to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

fn default_filter() -> &'static str {
    "core_auth=info,core_runtime=info,bridge_native=info,hyper=warn,reqwest=warn"
}

/// Initialize the global tracing subscriber
///
/// Call once at startup. Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| RuntimeError::InvalidConfig(format!("bad filter directive: {}", e)))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| RuntimeError::LoggingInit(e.to_string()))
}
