//! Basic Credentials Strategy
//!
//! Authenticates a username and password carried by the request, checked
//! against a backend (in-memory, directory service, etc.)

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use sesame_core::{Request, User};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::debug;

use crate::bridge::Strategy;
use crate::outcome::OutcomeChannel;
use crate::types::{AuthenticateOptions, StrategyKind};

/// Errors a credential backend can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Unknown user or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account exists but is disabled
    #[error("Account is disabled")]
    Disabled,

    /// The backend could not be reached
    #[error("Credential backend unavailable: {0}")]
    Unavailable(String),
}

/// Account returned by a backend after a successful check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique username (becomes the provider id)
    pub username: String,

    /// Display name
    pub name: Option<String>,

    pub email_address: Option<String>,
}

impl Account {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            name: None,
            email_address: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email_address(mut self, email_address: impl Into<String>) -> Self {
        self.email_address = Some(email_address.into());
        self
    }
}

/// Backend trait for credential checks
///
/// Implement this trait to integrate with different user directories.
#[async_trait]
pub trait CredentialBackend: Send + Sync {
    /// Check a username and password and return the account
    async fn verify(&self, username: &str, password: &str) -> Result<Account, CredentialError>;

    /// Get a description of this backend
    fn description(&self) -> &str {
        "credential backend"
    }
}

struct StoredAccount {
    account: Account,
    password: String,
    active: bool,
}

/// In-memory credential backend
///
/// Stores accounts in memory. Useful for development and testing.
#[derive(Default)]
pub struct InMemoryCredentialBackend {
    accounts: RwLock<HashMap<String, StoredAccount>>,
}

impl InMemoryCredentialBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account with its password
    pub fn register(&self, account: Account, password: impl Into<String>) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.insert(
            account.username.clone(),
            StoredAccount {
                account,
                password: password.into(),
                active: true,
            },
        );
    }

    /// Disable an account
    pub fn disable(&self, username: &str) -> bool {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        match accounts.get_mut(username) {
            Some(stored) => {
                stored.active = false;
                true
            }
            None => false,
        }
    }

    /// List all usernames
    pub fn usernames(&self) -> Vec<String> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.keys().cloned().collect()
    }
}

#[async_trait]
impl CredentialBackend for InMemoryCredentialBackend {
    async fn verify(&self, username: &str, password: &str) -> Result<Account, CredentialError> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);

        let stored = accounts
            .get(username)
            .filter(|stored| stored.password == password)
            .ok_or(CredentialError::InvalidCredentials)?;

        if !stored.active {
            return Err(CredentialError::Disabled);
        }

        Ok(stored.account.clone())
    }

    fn description(&self) -> &str {
        "in-memory credential backend"
    }
}

#[async_trait]
impl<B: CredentialBackend + ?Sized> CredentialBackend for Arc<B> {
    async fn verify(&self, username: &str, password: &str) -> Result<Account, CredentialError> {
        (**self).verify(username, password).await
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}

/// Credentials extracted from a request
enum Extracted {
    Found { username: String, password: String },
    Missing,
    Malformed(&'static str),
}

/// Username/password strategy
///
/// Reads `Authorization: Basic ...`, falling back to `username` and
/// `password` body fields.
///
/// | request | report |
/// |---|---|
/// | no credentials | `pass` |
/// | malformed basic header | `fail` (400) |
/// | wrong or disabled credentials | `fail` (401) |
/// | backend unavailable | `error` |
/// | valid | `success` |
pub struct BasicCredentialsStrategy {
    name: String,
    backend: Box<dyn CredentialBackend>,
}

impl BasicCredentialsStrategy {
    /// Create a strategy named `basic` over a backend
    pub fn new<B: CredentialBackend + 'static>(backend: B) -> Self {
        Self {
            name: "basic".to_string(),
            backend: Box::new(backend),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn extract(request: &Request) -> Extracted {
        if let Ok(Some(header)) = request.header_first("authorization") {
            if let Some(encoded) = strip_scheme(header, "basic") {
                return decode_basic(encoded);
            }
        }

        match (request.body_field("username"), request.body_field("password")) {
            (Some(username), Some(password)) if !username.is_empty() => Extracted::Found {
                username: username.to_string(),
                password: password.to_string(),
            },
            _ => Extracted::Missing,
        }
    }
}

/// Strip a case-insensitive auth scheme prefix
pub(crate) fn strip_scheme<'a>(header: &'a str, scheme: &str) -> Option<&'a str> {
    let (prefix, rest) = header.trim().split_once(' ')?;
    prefix.eq_ignore_ascii_case(scheme).then(|| rest.trim())
}

fn decode_basic(encoded: &str) -> Extracted {
    let Ok(decoded) = STANDARD.decode(encoded) else {
        return Extracted::Malformed("Invalid base64 in basic credentials");
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return Extracted::Malformed("Basic credentials are not valid UTF-8");
    };

    match decoded.split_once(':') {
        Some((username, password)) if !username.is_empty() => Extracted::Found {
            username: username.to_string(),
            password: password.to_string(),
        },
        _ => Extracted::Malformed("Basic credentials must be username:password"),
    }
}

#[async_trait]
impl Strategy for BasicCredentialsStrategy {
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
        let (username, password) = match Self::extract(request) {
            Extracted::Found { username, password } => (username, password),
            Extracted::Missing => {
                debug!(strategy = %self.name, "No credentials in request");
                return outcome.pass();
            }
            Extracted::Malformed(reason) => return outcome.fail_with(Some(reason.into()), Some(400)),
        };

        debug!(strategy = %self.name, backend = self.backend.description(), "Checking credentials");

        match self.backend.verify(&username, &password).await {
            Ok(account) => {
                let mut user = User::new(account.username.clone()).with_username(account.username);
                user.name = account.name;
                user.email_address = account.email_address;
                outcome.success(user, None);
            }
            Err(e @ (CredentialError::InvalidCredentials | CredentialError::Disabled)) => {
                outcome.fail(e.to_string());
            }
            Err(e @ CredentialError::Unavailable(_)) => outcome.error(e),
        }
    }
}
