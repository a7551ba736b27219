//! Strategy Bridge - runs strategies in order until one settles the request

use async_trait::async_trait;
use sesame_core::{AuthResponse, Request, WireRequest};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, Result};
use crate::outcome::{Outcome, OutcomeChannel};
use crate::types::{AttemptOutcome, AttemptSummary, AuthenticateOptions, StrategyKind};

/// Trait for authentication strategies
///
/// A strategy decides the outcome of one attempt by reporting exactly once
/// on the [`OutcomeChannel`] it is given. It may do asynchronous work
/// (calling an identity provider, querying a directory) before reporting,
/// and may move the channel into a spawned task. The attempt ends when the
/// channel is dropped.
///
/// Strategies are shared across concurrent calls and must not keep
/// per-call state.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Unique name of this strategy (for selection and logging)
    fn name(&self) -> &str;

    /// Family this strategy belongs to
    fn kind(&self) -> StrategyKind {
        StrategyKind::Custom
    }

    /// Examine the request and report an outcome
    async fn authenticate(
        &self,
        request: &Request,
        options: &AuthenticateOptions,
        outcome: OutcomeChannel,
    );
}

/// How a single attempt ended
enum Attempt {
    /// `redirect` or `success`
    Settled(AuthResponse),
    /// `fail`, `pass` or timeout
    Declined(AttemptOutcome),
}

/// Strategy Bridge
///
/// Holds an ordered list of strategies and folds their outcome reports
/// into one [`AuthResponse`]:
///
/// 1. strategies are tried in list order
/// 2. the first `redirect` or `success` finishes the call
/// 3. an `error` aborts the call; later strategies never run
/// 4. `fail`, `pass` and timeouts move on to the next strategy
/// 5. if no strategy settles the call it fails with
///    [`BridgeError::ExhaustedStrategies`]
pub struct Authenticator {
    strategies: Vec<Arc<dyn Strategy>>,
    attempt_timeout: Option<Duration>,
}

impl Authenticator {
    /// Create a bridge over an ordered strategy list
    pub fn new(strategies: Vec<Arc<dyn Strategy>>) -> Self {
        Self {
            strategies,
            attempt_timeout: None,
        }
    }

    /// Bound every attempt; expiry counts as that attempt's `fail`
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Names of the configured strategies, in order
    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    /// Translate a wire envelope and authenticate it
    pub async fn authenticate_wire(
        &self,
        wire: &WireRequest,
        options: &AuthenticateOptions,
    ) -> Result<AuthResponse> {
        let request = Request::from_wire(wire)?;
        self.authenticate(request, options).await
    }

    /// Run the strategies against a request
    pub async fn authenticate(
        &self,
        request: Request,
        options: &AuthenticateOptions,
    ) -> Result<AuthResponse> {
        if self.strategies.is_empty() {
            warn!("No strategies configured");
            return Err(BridgeError::ExhaustedStrategies { attempts: Vec::new() });
        }

        let mut attempts = Vec::with_capacity(self.strategies.len());

        for (index, strategy) in self.strategies.iter().enumerate() {
            let name = strategy.name();
            debug!(
                strategy = %name,
                kind = %strategy.kind(),
                attempt = index + 1,
                method = %request.method(),
                path = %request.path(),
                "Trying strategy"
            );

            match self.attempt(strategy.as_ref(), &request, options).await {
                Ok(Attempt::Settled(response)) => {
                    info!(strategy = %name, outcome = response.kind(), "Strategy settled request");
                    return Ok(response);
                }
                Ok(Attempt::Declined(outcome)) => {
                    let summary = AttemptSummary::new(name, outcome);
                    debug!(summary = %summary, "Strategy declined, trying next");
                    attempts.push(summary);
                }
                Err(e) => {
                    warn!(strategy = %name, error = %e, "Strategy errored, aborting");
                    return Err(e);
                }
            }
        }

        info!(attempts = attempts.len(), "All strategies have failed");
        Err(BridgeError::ExhaustedStrategies { attempts })
    }

    async fn attempt(
        &self,
        strategy: &dyn Strategy,
        request: &Request,
        options: &AuthenticateOptions,
    ) -> Result<Attempt> {
        let (channel, receiver) = OutcomeChannel::open(strategy.name());

        let run = async move {
            strategy.authenticate(request, options, channel).await;
            receiver.recv().await
        };

        let received = match self.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(received) => received,
                Err(_) => {
                    warn!(
                        strategy = %strategy.name(),
                        timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        "Strategy attempt timed out"
                    );
                    return Ok(Attempt::Declined(AttemptOutcome::TimedOut));
                }
            },
            None => run.await,
        };

        let outcome = received.map_err(|e| BridgeError::strategy(strategy.name(), e.to_string()))?;

        match outcome {
            Outcome::Error(err) => Err(BridgeError::strategy(strategy.name(), err.to_string())),
            Outcome::Fail { challenge, status } => {
                Ok(Attempt::Declined(AttemptOutcome::Failed { challenge, status }))
            }
            Outcome::Pass => Ok(Attempt::Declined(AttemptOutcome::Passed)),
            Outcome::Redirect { url, status } => {
                Ok(Attempt::Settled(AuthResponse::redirect(url, status)))
            }
            Outcome::Success { user, info } => {
                Ok(Attempt::Settled(AuthResponse::success(user, info)))
            }
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("strategies", &self.strategy_names())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

/// Builder for creating an Authenticator with strategies
pub struct AuthenticatorBuilder {
    strategies: Vec<Arc<dyn Strategy>>,
    attempt_timeout: Option<Duration>,
}

impl AuthenticatorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            attempt_timeout: None,
        }
    }

    /// Append a strategy; order of calls is the order strategies are tried
    pub fn with_strategy<S: Strategy + 'static>(self, strategy: S) -> Self {
        self.with_shared_strategy(Arc::new(strategy))
    }

    /// Append a strategy that is also held elsewhere
    pub fn with_shared_strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        info!(
            strategy = strategy.name(),
            kind = %strategy.kind(),
            position = self.strategies.len() + 1,
            "Registered strategy"
        );
        self.strategies.push(strategy);
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Build the authenticator
    ///
    /// Rejects an empty list, empty names and duplicate names.
    pub fn build(self) -> Result<Authenticator> {
        if self.strategies.is_empty() {
            return Err(BridgeError::InvalidArgument(
                "At least one strategy required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for strategy in &self.strategies {
            let name = strategy.name();
            if name.is_empty() {
                return Err(BridgeError::InvalidArgument(
                    "Strategy name cannot be empty".into(),
                ));
            }
            if !seen.insert(name) {
                return Err(BridgeError::InvalidArgument(format!(
                    "Duplicate strategy name: {}",
                    name
                )));
            }
        }

        Ok(Authenticator {
            strategies: self.strategies,
            attempt_timeout: self.attempt_timeout,
        })
    }
}

impl Default for AuthenticatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
