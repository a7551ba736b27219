//! Response envelope returned by a successful authenticate call

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::user::{SanitizedUser, User};

/// Status used when a strategy redirects without naming one
pub const DEFAULT_REDIRECT_STATUS: u16 = 302;

/// Redirect the user agent elsewhere, usually to an identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub url: String,
    pub status: u16,
}

/// Authentication succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Success {
    pub user: SanitizedUser,

    /// JSON-encoded info object from the strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// Outcome of an authenticate call. Exactly one variant is populated.
///
/// Serializes as `{"redirect": {...}}` or `{"success": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthResponse {
    Redirect(Redirect),
    Success(Success),
}

impl AuthResponse {
    /// Redirect response, defaulting the status to 302
    pub fn redirect(url: impl Into<String>, status: Option<u16>) -> Self {
        AuthResponse::Redirect(Redirect {
            url: url.into(),
            status: status.unwrap_or(DEFAULT_REDIRECT_STATUS),
        })
    }

    /// Success response
    ///
    /// Tokens are sanitized here, so no success response can carry an
    /// empty or absent token.
    pub fn success(user: User, info: Option<Value>) -> Self {
        AuthResponse::Success(Success {
            user: user.sanitize(),
            info: info.map(|info| info.to_string()),
        })
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, AuthResponse::Redirect(_))
    }

    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AuthResponse::Redirect(_) => "redirect",
            AuthResponse::Success(_) => "success",
        }
    }
}
