//! API error types and responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sesame_bridge::{AttemptSummary, BridgeError};
use sesame_core::{CoreError, ErrorCategory, RouteId};
use thiserror::Error;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Route '{0}' is disabled")]
    RouteDisabled(RouteId),

    #[error("Strategy '{strategy}' errored: {message}")]
    StrategyError { strategy: String, message: String },

    #[error("All strategies have failed")]
    Unauthenticated { attempts: Vec<AttemptSummary> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            ApiError::RouteDisabled(_) => ErrorCategory::NotFound,
            ApiError::StrategyError { .. } => ErrorCategory::FailedPrecondition,
            ApiError::Unauthenticated { .. } => ErrorCategory::Unauthenticated,
            ApiError::Internal(_) => ErrorCategory::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
            ErrorCategory::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::RouteDisabled(route) => Some(serde_json::json!({ "route": route })),
            ApiError::StrategyError { strategy, .. } => {
                Some(serde_json::json!({ "strategy": strategy }))
            }
            ApiError::Unauthenticated { attempts } => {
                Some(serde_json::json!({ "attempts": attempts }))
            }
            ApiError::InvalidArgument(_) | ApiError::Internal(_) => None,
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: self.category().to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::InvalidRequest(err) => err.into(),
            BridgeError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            BridgeError::StrategyError { strategy, message } => {
                ApiError::StrategyError { strategy, message }
            }
            BridgeError::ExhaustedStrategies { attempts } => ApiError::Unauthenticated { attempts },
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err.category() {
            ErrorCategory::InvalidArgument => ApiError::InvalidArgument(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidArgument(rejection.body_text())
    }
}
