//! Error types for the sesame core types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using CoreError
pub type Result<T> = std::result::Result<T, CoreError>;

/// Coarse error category surfaced across the RPC boundary
///
/// Mirrors the status codes a caller can act on. Every error type in the
/// workspace maps onto exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Caller supplied malformed input
    InvalidArgument,
    /// The requested operation is not available
    NotFound,
    /// A strategy reported an internal failure
    FailedPrecondition,
    /// No strategy authenticated the request
    Unauthenticated,
    /// Anything else
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCategory::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCategory::NotFound => "NOT_FOUND",
            ErrorCategory::FailedPrecondition => "FAILED_PRECONDITION",
            ErrorCategory::Unauthenticated => "UNAUTHENTICATED",
            ErrorCategory::Internal => "INTERNAL",
        };
        f.write_str(code)
    }
}

/// Errors raised while building or reading core values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Accessor called with an argument outside its contract
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A wire envelope field other than `body` is malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Route name that does not correspond to any known route
    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Category this error is reported under
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::InvalidArgument(_)
            | CoreError::InvalidRequest(_)
            | CoreError::UnknownRoute(_) => ErrorCategory::InvalidArgument,
            CoreError::Serialization(_) => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}
