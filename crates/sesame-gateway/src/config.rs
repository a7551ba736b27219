//! Gateway configuration
//!
//! Read once at startup from `SESAME_*` environment variables and turned
//! into the explicit values the bridge and route gate are built from.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `SESAME_PORT` | listen port | `3000` |
//! | `SESAME_LOG_LEVEL` | log level | `info` |
//! | `SESAME_NAME` | service name reported on `/ready` | none |
//! | `SESAME_ROUTES` | `route=bool` pairs, comma separated | every route disabled |
//! | `SESAME_ATTEMPT_TIMEOUT_SECS` | per-attempt timeout, `0` disables | `30` |
//! | `SESAME_BEARER_SECRET` | enables the bearer strategy | none |
//! | `SESAME_BEARER_ISSUER` | expected bearer issuer | none |
//! | `SESAME_BEARER_AUDIENCE` | expected bearer audience | none |
//! | `SESAME_CREDENTIALS` | `user:password[:email]` entries, `;` separated | none |

use sesame_bridge::strategies::{
    Account, BasicCredentialsStrategy, BearerTokenConfig, BearerTokenStrategy,
    InMemoryCredentialBackend,
};
use sesame_bridge::{Authenticator, AuthenticatorBuilder};
use sesame_core::{RouteGate, RouteId};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors; all of them abort startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("At least one strategy required: set SESAME_BEARER_SECRET or SESAME_CREDENTIALS")]
    NoStrategies,

    #[error("Failed to build authenticator: {0}")]
    Authenticator(String),
}

fn invalid(var: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: message.into(),
    }
}

/// A user accepted by the basic-credentials strategy
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialEntry {
    pub username: String,
    pub password: String,
    pub email_address: Option<String>,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("email_address", &self.email_address)
            .finish()
    }
}

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen port
    pub port: u16,
    /// Maximum log level
    pub log_level: Level,
    /// Human-readable name of this gateway
    pub name: Option<String>,
    /// Route enablement map
    pub routes: HashMap<RouteId, bool>,
    /// Per-attempt strategy timeout
    pub attempt_timeout: Option<Duration>,
    /// Bearer strategy, when enabled
    pub bearer: Option<BearerTokenConfig>,
    /// Basic-credentials accounts; empty disables the strategy
    pub credentials: Vec<CredentialEntry>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: Level::INFO,
            name: None,
            routes: HashMap::new(),
            attempt_timeout: Some(Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS)),
            bearer: None,
            credentials: Vec::new(),
        }
    }
}

impl GatewayConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through a variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = GatewayConfig::default();

        if let Some(port) = get("SESAME_PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| invalid("SESAME_PORT", format!("not a port number: {}", port)))?;
        }

        if let Some(level) = get("SESAME_LOG_LEVEL") {
            config.log_level = level
                .trim()
                .parse()
                .map_err(|_| invalid("SESAME_LOG_LEVEL", format!("unknown level: {}", level)))?;
        }

        config.name = get("SESAME_NAME");

        if let Some(routes) = get("SESAME_ROUTES") {
            config.routes = parse_routes(&routes)?;
        }

        if let Some(timeout) = get("SESAME_ATTEMPT_TIMEOUT_SECS") {
            let secs: u64 = timeout.trim().parse().map_err(|_| {
                invalid("SESAME_ATTEMPT_TIMEOUT_SECS", format!("not a number: {}", timeout))
            })?;
            config.attempt_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(secret) = get("SESAME_BEARER_SECRET") {
            let mut bearer = BearerTokenConfig::new(secret.into_bytes());
            if let Some(issuer) = get("SESAME_BEARER_ISSUER") {
                bearer = bearer.with_issuer(issuer);
            }
            if let Some(audience) = get("SESAME_BEARER_AUDIENCE") {
                bearer = bearer.with_audience(audience);
            }
            config.bearer = Some(bearer);
        }

        if let Some(credentials) = get("SESAME_CREDENTIALS") {
            config.credentials = parse_credentials(&credentials)?;
        }

        Ok(config)
    }

    /// Route gate built from the enablement map
    pub fn route_gate(&self) -> RouteGate {
        RouteGate::new(self.routes.clone())
    }

    /// Authenticator over the configured strategies
    ///
    /// Strategies are tried bearer first, then basic credentials.
    pub fn authenticator(&self) -> Result<Authenticator, ConfigError> {
        let mut builder = AuthenticatorBuilder::new();

        if let Some(bearer) = &self.bearer {
            builder = builder.with_strategy(BearerTokenStrategy::new(bearer.clone()));
        }

        if !self.credentials.is_empty() {
            let backend = InMemoryCredentialBackend::new();
            for entry in &self.credentials {
                let mut account = Account::new(entry.username.clone());
                if let Some(email) = &entry.email_address {
                    account = account.with_email_address(email.clone());
                }
                backend.register(account, entry.password.clone());
            }
            builder = builder.with_strategy(BasicCredentialsStrategy::new(backend));
        }

        if let Some(timeout) = self.attempt_timeout {
            builder = builder.with_attempt_timeout(timeout);
        }

        if self.bearer.is_none() && self.credentials.is_empty() {
            return Err(ConfigError::NoStrategies);
        }

        builder
            .build()
            .map_err(|e| ConfigError::Authenticator(e.to_string()))
    }
}

/// Parse `login-get=true,callback-get` (a bare name means enabled)
fn parse_routes(raw: &str) -> Result<HashMap<RouteId, bool>, ConfigError> {
    let mut routes = HashMap::new();

    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, enabled) = match pair.split_once('=') {
            Some((name, value)) => {
                let enabled = value.trim().parse::<bool>().map_err(|_| {
                    invalid("SESAME_ROUTES", format!("expected true or false for {}", name))
                })?;
                (name.trim(), enabled)
            }
            None => (pair, true),
        };

        let route = name
            .parse::<RouteId>()
            .map_err(|e| invalid("SESAME_ROUTES", e.to_string()))?;
        routes.insert(route, enabled);
    }

    Ok(routes)
}

/// Parse `alice:secret:alice@example.com;bob:hunter2`
fn parse_credentials(raw: &str) -> Result<Vec<CredentialEntry>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let username = parts.next().unwrap_or_default();
            let password = parts
                .next()
                .ok_or_else(|| invalid("SESAME_CREDENTIALS", "expected user:password[:email]"))?;

            if username.is_empty() || password.is_empty() {
                return Err(invalid(
                    "SESAME_CREDENTIALS",
                    "username and password cannot be empty",
                ));
            }

            Ok(CredentialEntry {
                username: username.to_string(),
                password: password.to_string(),
                email_address: parts.next().filter(|e| !e.is_empty()).map(String::from),
            })
        })
        .collect()
}
