//! Strategy Bridge
//!
//! The bridge runs an inbound request through an ordered list of pluggable
//! authentication strategies and returns a single outcome: redirect the
//! user agent to an identity provider, or an authenticated user.
//!
//! ## Architecture
//!
//! Each strategy reports its decision through a fresh [`OutcomeChannel`]
//! opened for that attempt alone:
//!
//! - **error**: the call fails immediately
//! - **fail** / **pass**: the next strategy is tried
//! - **redirect** / **success**: the call finishes with that response
//!
//! Tokens on a successful user are sanitized before the response leaves
//! the bridge.
//!
//! ## Built-in strategies
//!
//! - **Basic credentials**: username/password checked against a backend
//! - **Bearer token**: HS256 JWT in the `Authorization` header
//! - **Scripted**: for testing purposes
//!
//! ## Usage
//!
//! ```ignore
//! use sesame_bridge::{AuthenticatorBuilder, AuthenticateOptions, strategies::*};
//!
//! let authenticator = AuthenticatorBuilder::new()
//!     .with_strategy(BearerTokenStrategy::new(BearerTokenConfig::new(secret)))
//!     .with_strategy(BasicCredentialsStrategy::new(backend))
//!     .with_attempt_timeout(Duration::from_secs(30))
//!     .build()?;
//!
//! let response = authenticator
//!     .authenticate_wire(&envelope, &AuthenticateOptions::default())
//!     .await?;
//! ```

pub mod bridge;
pub mod error;
pub mod outcome;
pub mod strategies;
pub mod types;

pub use bridge::{Authenticator, AuthenticatorBuilder, Strategy};
pub use error::{BridgeError, Result};
pub use outcome::{Outcome, OutcomeChannel, OutcomeError, OutcomeReceiver, StrategyFailure};
pub use types::{AttemptOutcome, AttemptSummary, AuthenticateOptions, StrategyKind};
