//! Users reported by strategies, and the token sanitizer
//!
//! A strategy reports a [`User`] whose tokens may be empty or absent (an
//! OAuth provider that issues no refresh token, for example). The only way
//! to turn it into the [`SanitizedUser`] a response carries is
//! [`User::sanitize`], which drops those entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User as reported by a strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User id according to the provider
    pub provider_id: String,

    /// Provider tokens; values may be empty or absent
    #[serde(default)]
    pub tokens: BTreeMap<String, Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

impl User {
    /// Create a user with no tokens or profile details
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            tokens: BTreeMap::new(),
            name: None,
            username: None,
            email_address: None,
        }
    }

    /// Add a token. `None` records the token as absent.
    pub fn with_token(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.tokens.insert(key.into(), value);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_email_address(mut self, email_address: impl Into<String>) -> Self {
        self.email_address = Some(email_address.into());
        self
    }

    /// Drop empty and absent tokens
    pub fn sanitize(self) -> SanitizedUser {
        SanitizedUser {
            provider_id: self.provider_id,
            tokens: sanitize_tokens(self.tokens),
            name: self.name,
            username: self.username,
            email_address: self.email_address,
        }
    }
}

/// User as returned to the caller
///
/// Every token value is present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedUser {
    pub provider_id: String,

    pub tokens: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

/// Remove every token whose value is empty or absent
pub fn sanitize_tokens(tokens: BTreeMap<String, Option<String>>) -> BTreeMap<String, String> {
    tokens
        .into_iter()
        .filter_map(|(key, value)| match value {
            Some(value) if !value.is_empty() => Some((key, value)),
            _ => None,
        })
        .collect()
}
