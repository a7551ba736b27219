//! Outcome Channel
//!
//! A strategy reports its decision for one attempt through an
//! [`OutcomeChannel`]. The channel offers five mutually exclusive reports:
//!
//! | report | meaning | bridge reaction |
//! |---|---|---|
//! | `error` | internal failure | abort the whole call |
//! | `fail` | strategy declines | try the next strategy |
//! | `pass` | strategy abstains | try the next strategy |
//! | `redirect` | send the user agent elsewhere | finish with a redirect |
//! | `success` | user authenticated | finish with the user |
//!
//! A channel is opened per attempt and moved into the strategy, so no two
//! calls ever share one. The attempt settles once the strategy releases the
//! channel by dropping it, whether from `authenticate` itself or from a
//! task it spawned. Only the first report is delivered. Any further report
//! is rejected, logged and counted, and the bridge treats the attempt as a
//! strategy error. Dropping the channel without reporting is also a
//! contract violation.

use serde_json::Value;
use sesame_core::User;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::types::DEFAULT_FAIL_STATUS;

/// Error a strategy passes to [`OutcomeChannel::error`]
pub type StrategyFailure = Box<dyn std::error::Error + Send + Sync>;

/// A single report made through an outcome channel
#[derive(Debug)]
pub enum Outcome {
    Error(StrategyFailure),
    Fail {
        challenge: Option<String>,
        status: u16,
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
}

impl Outcome {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Error(_) => "error",
            Outcome::Fail { .. } => "fail",
            Outcome::Pass => "pass",
            Outcome::Redirect { .. } => "redirect",
            Outcome::Success { .. } => "success",
        }
    }
}

/// Outcome contract violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutcomeError {
    /// The channel was dropped before anything was reported
    #[error("strategy finished without reporting an outcome")]
    NotReported,

    /// More than one report was made on the channel
    #[error("strategy reported {0} outcomes, expected exactly one")]
    MultipleReports(usize),
}

/// Per-attempt reporting handle given to a strategy
pub struct OutcomeChannel {
    strategy: Arc<str>,
    sender: Mutex<Option<oneshot::Sender<Outcome>>>,
    reports: Arc<AtomicUsize>,
    /// Never sent on; dropping it tells the receiver the channel is released
    _released: oneshot::Sender<()>,
}

/// Bridge side of an [`OutcomeChannel`]
pub struct OutcomeReceiver {
    receiver: oneshot::Receiver<Outcome>,
    released: oneshot::Receiver<()>,
    reports: Arc<AtomicUsize>,
}

impl OutcomeChannel {
    /// Open a fresh channel for one attempt of `strategy`
    pub fn open(strategy: &str) -> (OutcomeChannel, OutcomeReceiver) {
        let (sender, receiver) = oneshot::channel();
        let (release, released) = oneshot::channel();
        let reports = Arc::new(AtomicUsize::new(0));

        let channel = OutcomeChannel {
            strategy: Arc::from(strategy),
            sender: Mutex::new(Some(sender)),
            reports: reports.clone(),
            _released: release,
        };

        let receiver = OutcomeReceiver {
            receiver,
            released,
            reports,
        };

        (channel, receiver)
    }

    /// Whether a report has already been made
    pub fn is_reported(&self) -> bool {
        self.reports.load(Ordering::SeqCst) > 0
    }

    /// Internal failure; aborts the authenticate call
    pub fn error(&self, err: impl Into<StrategyFailure>) {
        self.report(Outcome::Error(err.into()));
    }

    /// Decline with a challenge message and the default 401 status
    pub fn fail(&self, challenge: impl Into<String>) {
        self.fail_with(Some(challenge.into()), None);
    }

    /// Decline with an optional challenge and status
    pub fn fail_with(&self, challenge: Option<String>, status: Option<u16>) {
        self.report(Outcome::Fail {
            challenge,
            status: status.unwrap_or(DEFAULT_FAIL_STATUS),
        });
    }

    /// Abstain
    pub fn pass(&self) {
        self.report(Outcome::Pass);
    }

    /// Redirect with the default status
    pub fn redirect(&self, url: impl Into<String>) {
        self.redirect_with_status(url, None);
    }

    pub fn redirect_with_status(&self, url: impl Into<String>, status: Option<u16>) {
        self.report(Outcome::Redirect {
            url: url.into(),
            status,
        });
    }

    /// Authenticated, with an optional info object
    pub fn success(&self, user: User, info: Option<Value>) {
        self.report(Outcome::Success { user, info });
    }

    fn report(&self, outcome: Outcome) {
        let count = self.reports.fetch_add(1, Ordering::SeqCst) + 1;
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(sender) => {
                let kind = outcome.kind();
                if sender.send(outcome).is_err() {
                    // The call was cancelled while the strategy was working
                    debug!(strategy = %self.strategy, outcome = kind, "Outcome reported after attempt was abandoned");
                }
            }
            None => {
                warn!(
                    strategy = %self.strategy,
                    outcome = outcome.kind(),
                    reports = count,
                    "Strategy reported more than one outcome"
                );
            }
        }
    }
}

impl std::fmt::Debug for OutcomeChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeChannel")
            .field("strategy", &self.strategy)
            .field("reports", &self.reports.load(Ordering::SeqCst))
            .finish()
    }
}

impl OutcomeReceiver {
    /// Wait for the strategy to release its channel, then take the report
    ///
    /// Fails if the channel was dropped unused, or if it carried more than
    /// one report over its lifetime.
    pub async fn recv(self) -> Result<Outcome, OutcomeError> {
        // Only ever resolves with an error, once the sender half is dropped
        let _ = self.released.await;

        let outcome = self.receiver.await.map_err(|_| OutcomeError::NotReported)?;

        match self.reports.load(Ordering::SeqCst) {
            1 => Ok(outcome),
            n => Err(OutcomeError::MultipleReports(n)),
        }
    }
}
