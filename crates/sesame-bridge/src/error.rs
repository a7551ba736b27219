//! Error types for the Strategy Bridge

use sesame_core::{CoreError, ErrorCategory};
use thiserror::Error;

use crate::types::AttemptSummary;

/// Result type for Strategy Bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can end an authenticate call
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The inbound envelope could not be translated
    #[error(transparent)]
    InvalidRequest(#[from] CoreError),

    /// The strategy list is malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A strategy reported `error`, or broke the outcome contract
    #[error("Strategy '{strategy}' errored: {message}")]
    StrategyError { strategy: String, message: String },

    /// No strategy redirected or succeeded
    #[error("All strategies have failed")]
    ExhaustedStrategies { attempts: Vec<AttemptSummary> },
}

impl BridgeError {
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        BridgeError::StrategyError {
            strategy: strategy.into(),
            message: message.into(),
        }
    }

    /// Category this error is reported under at the RPC boundary
    pub fn category(&self) -> ErrorCategory {
        match self {
            BridgeError::InvalidRequest(err) => err.category(),
            BridgeError::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            BridgeError::StrategyError { .. } => ErrorCategory::FailedPrecondition,
            BridgeError::ExhaustedStrategies { .. } => ErrorCategory::Unauthenticated,
        }
    }
}
