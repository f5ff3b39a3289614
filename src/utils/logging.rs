//! Logging setup and output formatting

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::{ReelForgeError, ReelForgeResult};

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// General information
    #[default]
    Info,
    /// Debug information
    Debug,
    /// Very verbose debug information
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ReelForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(ReelForgeError::ConfigError(format!(
                "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                other
            ))),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `level` when set.
///
/// Calling this twice keeps the first subscriber and returns an error.
pub fn init_logging(level: LogLevel, json: bool) -> ReelForgeResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("reelforge_cli={},warn", level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ReelForgeError::LoggingError(e.to_string()))?;

    tracing::debug!(level = %level, json, "Logging initialized");
    Ok(())
}

/// Log build and platform details once at startup
pub fn log_system_info() {
    tracing::info!("=== ReelForge ===");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    #[cfg(target_os = "macos")]
    tracing::info!("Platform: macOS");
    #[cfg(target_os = "linux")]
    tracing::info!("Platform: Linux");
    #[cfg(target_os = "windows")]
    tracing::info!("Platform: Windows");

    tracing::debug!("Logical CPUs: {}", num_cpus::get());
}
