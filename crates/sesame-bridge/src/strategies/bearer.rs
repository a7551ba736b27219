//! Bearer Token Strategy
//!
//! Validates HS256 JWTs presented as bearer tokens.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sesame_core::{Request, User};
use std::collections::HashMap;
use tracing::debug;

use crate::bridge::Strategy;
use crate::outcome::OutcomeChannel;
use crate::strategies::credentials::strip_scheme;
use crate::types::{AuthenticateOptions, StrategyKind};

/// Query parameters a token may arrive in when no header is present
const TOKEN_QUERY_PARAMS: [&str; 2] = ["access_token", "token"];

/// Configuration for the bearer token strategy
#[derive(Clone)]
pub struct BearerTokenConfig {
    secret: Vec<u8>,

    /// Expected issuer (iss claim), if any
    pub issuer: Option<String>,

    /// Expected audience (aud claim), if any
    pub audience: Option<String>,

    /// Clock skew tolerance in seconds
    pub leeway_secs: u64,
}

impl BearerTokenConfig {
    /// Create a configuration for tokens signed with `secret`
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
            leeway_secs: 30,
        }
    }

    /// Set the expected issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the expected audience
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_leeway_secs(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

impl std::fmt::Debug for BearerTokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// JWT claims we care about
#[derive(Debug, Deserialize)]
struct BearerClaims {
    /// Subject
    sub: Option<String>,
    /// Issuer
    iss: Option<String>,
    /// Expiration
    exp: Option<i64>,
    name: Option<String>,
    preferred_username: Option<String>,
    email: Option<String>,
    /// All other claims
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

/// Bearer token strategy
///
/// Looks for `Authorization: Bearer <jwt>`, then the `access_token` and
/// `token` query parameters.
///
/// | request | report |
/// |---|---|
/// | no token | `pass` |
/// | bad signature, expired, wrong issuer or audience | `fail` (401) |
/// | no `sub` claim | `fail` (401) |
/// | valid | `success`, with the token as `accessToken` |
pub struct BearerTokenStrategy {
    name: String,
    key: DecodingKey,
    validation: Validation,
}

impl BearerTokenStrategy {
    /// Create a strategy named `bearer`
    pub fn new(config: BearerTokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;

        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }

        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        Self {
            name: "bearer".to_string(),
            key: DecodingKey::from_secret(&config.secret),
            validation,
        }
    }

    fn extract(request: &Request) -> Option<String> {
        if let Ok(Some(header)) = request.header_first("authorization") {
            if let Some(token) = strip_scheme(header, "bearer") {
                return Some(token.to_string());
            }
        }

        TOKEN_QUERY_PARAMS
            .iter()
            .find_map(|param| request.query(param))
            .filter(|token| !token.is_empty())
            .map(String::from)
    }
}

#[async_trait]
impl Strategy for BearerTokenStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Credentials
    }

    async fn authenticate(
        &self,
        request: &Request,
        _options: &AuthenticateOptions,
        outcome: OutcomeChannel,
    ) {
        let Some(token) = Self::extract(request) else {
            debug!(strategy = %self.name, "No bearer token in request");
            return outcome.pass();
        };

        let claims = match decode::<BearerClaims>(&token, &self.key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(strategy = %self.name, error = %e, "Bearer token rejected");
                return outcome.fail(format!("Invalid bearer token: {}", e));
            }
        };

        let Some(subject) = claims.sub.filter(|sub| !sub.is_empty()) else {
            return outcome.fail("Bearer token has no subject");
        };

        let mut user = User::new(subject).with_token("accessToken", Some(token));
        user.name = claims.name;
        user.username = claims.preferred_username;
        user.email_address = claims.email;

        let mut info = Map::new();
        if let Some(iss) = claims.iss {
            info.insert("issuer".into(), json!(iss));
        }
        if let Some(exp_time) = claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()) {
            info.insert("expiresAt".into(), json!(exp_time.to_rfc3339()));
        }
        if let Some(scope) = claims.extra.get("scope").and_then(Value::as_str) {
            info.insert(
                "scopes".into(),
                json!(scope.split_whitespace().collect::<Vec<_>>()),
            );
        }

        let info = (!info.is_empty()).then_some(Value::Object(info));
        outcome.success(user, info);
    }
}
