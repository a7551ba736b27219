//! Scripted Strategy
//!
//! For testing purposes - reports a preconfigured outcome.

use async_trait::async_trait;
use serde_json::Value;
use sesame_core::{Request, User};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::bridge::Strategy;
use crate::outcome::OutcomeChannel;
use crate::types::AuthenticateOptions;

/// What a [`ScriptedStrategy`] reports
#[derive(Debug, Clone)]
pub enum Script {
    Error(String),
    Fail {
        challenge: Option<String>,
        status: Option<u16>,
    },
    Pass,
    Redirect {
        url: String,
        status: Option<u16>,
    },
    Success {
        user: User,
        info: Option<Value>,
    },
    /// Report nothing at all
    Silent,
    /// Report every script in turn on the same channel
    Sequence(Vec<Script>),
}

impl Script {
    pub fn fail(challenge: impl Into<String>) -> Self {
        Script::Fail {
            challenge: Some(challenge.into()),
            status: None,
        }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Script::Redirect {
            url: url.into(),
            status: None,
        }
    }

    pub fn success(user: User) -> Self {
        Script::Success { user, info: None }
    }

    fn play(&self, outcome: &OutcomeChannel) {
        match self {
            Script::Error(message) => outcome.error(message.clone()),
            Script::Fail { challenge, status } => outcome.fail_with(challenge.clone(), *status),
            Script::Pass => outcome.pass(),
            Script::Redirect { url, status } => outcome.redirect_with_status(url.clone(), *status),
            Script::Success { user, info } => outcome.success(user.clone(), info.clone()),
            Script::Silent => {}
            Script::Sequence(scripts) => {
                for script in scripts {
                    script.play(outcome);
                }
            }
        }
    }
}

/// Strategy that reports a fixed [`Script`]
///
/// Optionally waits before reporting, or reports from a spawned task the
/// way callback-driven strategies do. Counts how often it was invoked.
pub struct ScriptedStrategy {
    name: String,
    script: Script,
    delay: Option<Duration>,
    spawn: bool,
    invocations: AtomicUsize,
}

impl ScriptedStrategy {
    /// Create a new scripted strategy
    pub fn new(name: impl Into<String>, script: Script) -> Self {
        Self {
            name: name.into(),
            script,
            delay: None,
            spawn: false,
            invocations: AtomicUsize::new(0),
        }
    }

    /// Sleep before reporting
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report from a detached task after `authenticate` has returned
    pub fn spawned(mut self) -> Self {
        self.spawn = true;
        self
    }

    /// Number of times `authenticate` was called
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn authenticate(
        &self,
        _request: &Request,
        _options: &AuthenticateOptions,
        outcome: OutcomeChannel,
    ) {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        let script = self.script.clone();
        let delay = self.delay;
        let report = async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            script.play(&outcome);
        };

        if self.spawn {
            tokio::spawn(report);
        } else {
            report.await;
        }
    }
}
