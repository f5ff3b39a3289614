// Domain errors - Error types for the domain layer

use std::fmt;

/// Domain-specific error types
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Invalid arguments provided
    BadArgs(String),
    /// File not found
    FileNotFound(String),
    /// Parameter combination rejected before any engine invocation
    ValidationFailed(String),
    /// Platform identifier not present in the preset table
    UnknownPlatform(String),
    /// External media engine exited with an error
    EngineFailed(String),
    /// Media probe failed or returned unusable data
    ProbeFail(String),
    /// File system operation failed
    FsFail(String),
    /// Stage exceeded its time budget
    Timeout(String),
    /// Internal error
    InternalError(String),
}

impl DomainError {
    /// Whether the error was raised before any external engine invocation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::BadArgs(_)
                | DomainError::FileNotFound(_)
                | DomainError::ValidationFailed(_)
                | DomainError::UnknownPlatform(_)
        )
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            DomainError::FileNotFound(msg) => write!(f, "File not found: {}", msg),
            DomainError::ValidationFailed(msg) => write!(f, "Validation failed: {}", msg),
            DomainError::UnknownPlatform(id) => write!(
                f,
                "Unknown platform: {}. Valid platforms: tiktok, instagram, youtube-shorts, facebook",
                id
            ),
            DomainError::EngineFailed(msg) => write!(f, "Media engine failed: {}", msg),
            DomainError::ProbeFail(msg) => write!(f, "Probe failed: {}", msg),
            DomainError::FsFail(msg) => write!(f, "File system error: {}", msg),
            DomainError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            DomainError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::FsFail(err.to_string())
    }
}
