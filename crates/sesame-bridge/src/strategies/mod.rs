//! Built-in authentication strategies

pub mod bearer;
pub mod credentials;
pub mod scripted;

pub use bearer::{BearerTokenConfig, BearerTokenStrategy};
pub use credentials::{
    Account, BasicCredentialsStrategy, CredentialBackend, CredentialError,
    InMemoryCredentialBackend,
};
pub use scripted::{Script, ScriptedStrategy};
