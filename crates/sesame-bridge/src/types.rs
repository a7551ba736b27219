//! Core types for the Strategy Bridge

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Status a `fail` report carries when the strategy names none
pub const DEFAULT_FAIL_STATUS: u16 = 401;

/// Broad family a strategy belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Redirects to and receives callbacks from an identity provider
    OAuth,
    /// Checks credentials carried by the request itself
    Credentials,
    /// Anything else
    Custom,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::OAuth => write!(f, "oauth"),
            StrategyKind::Credentials => write!(f, "credentials"),
            StrategyKind::Custom => write!(f, "custom"),
        }
    }
}

/// Options passed unchanged to every strategy attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticateOptions {
    /// Requested scopes
    #[serde(default)]
    pub scope: Vec<String>,

    /// Opaque state to round-trip through an identity provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Strategy-specific options
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl AuthenticateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope.push(scope.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Why a strategy attempt did not settle the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The strategy reported `fail`
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        challenge: Option<String>,
        status: u16,
    },
    /// The strategy reported `pass`
    Passed,
    /// The per-attempt timeout expired
    TimedOut,
}

/// One inconclusive attempt, kept for the exhausted-strategies error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSummary {
    pub strategy: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl AttemptSummary {
    pub fn new(strategy: impl Into<String>, outcome: AttemptOutcome) -> Self {
        Self {
            strategy: strategy.into(),
            outcome,
        }
    }
}

impl std::fmt::Display for AttemptSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            AttemptOutcome::Failed { challenge: Some(challenge), status } => {
                write!(f, "{}: failed ({}: {})", self.strategy, status, challenge)
            }
            AttemptOutcome::Failed { challenge: None, status } => {
                write!(f, "{}: failed ({})", self.strategy, status)
            }
            AttemptOutcome::Passed => write!(f, "{}: passed", self.strategy),
            AttemptOutcome::TimedOut => write!(f, "{}: timed out", self.strategy),
        }
    }
}
