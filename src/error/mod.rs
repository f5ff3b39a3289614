//! Error handling module for ReelForge

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Error type for the outer layers: settings, job files, logging setup
#[derive(Error, Debug)]
pub enum ReelForgeError {
    /// Input or job file not found or inaccessible
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Job file that cannot be read as a pipeline or variant batch
    #[error("Invalid job file {path}: {message}")]
    InvalidJobFile { path: String, message: String },

    /// Settings error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Subscriber installation failed
    #[error("Logging setup failed: {0}")]
    LoggingError(String),

    /// Error raised by the pipeline core
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for ReelForge operations
pub type ReelForgeResult<T> = std::result::Result<T, ReelForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_is_transparent() {
        let err: ReelForgeError = DomainError::UnknownPlatform("vine".to_string()).into();
        assert_eq!(
            err.to_string(),
            DomainError::UnknownPlatform("vine".to_string()).to_string()
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ReelForgeError = parse.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
