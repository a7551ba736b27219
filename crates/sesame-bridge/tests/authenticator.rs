//! Behaviour Tests for the Strategy Bridge
//!
//! These tests verify how the bridge folds strategy outcomes:
//! - Fallback past `fail` and `pass`
//! - Short-circuit on `redirect`, `success` and `error`
//! - Token sanitization on success
//! - Contract violations and per-attempt timeouts
//! - Isolation between concurrent calls

use async_trait::async_trait;
use serde_json::json;
use sesame_bridge::strategies::{Script, ScriptedStrategy};
use sesame_bridge::{
    AttemptOutcome, AuthenticateOptions, Authenticator, AuthenticatorBuilder, BridgeError,
    OutcomeChannel, Strategy,
};
use sesame_core::{AuthResponse, Redirect, Request, User, WireRequest};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Test Helpers
// =============================================================================

fn request() -> Request {
    Request::from_wire(&WireRequest::new("GET", "/providers/github/login")).unwrap()
}

fn scripted(name: &str, script: Script) -> Arc<ScriptedStrategy> {
    Arc::new(ScriptedStrategy::new(name, script))
}

fn authenticator(strategies: &[Arc<ScriptedStrategy>]) -> Authenticator {
    strategies
        .iter()
        .fold(AuthenticatorBuilder::new(), |builder, strategy| {
            builder.with_shared_strategy(strategy.clone())
        })
        .build()
        .expect("Failed to build authenticator")
}

/// Reports success from a spawned task, then reports again after yielding
struct LateSecondReport;

#[async_trait]
impl Strategy for LateSecondReport {
    fn name(&self) -> &str {
        "late"
    }

    async fn authenticate(
        &self,
        _request: &Request,
        _options: &AuthenticateOptions,
        outcome: OutcomeChannel,
    ) {
        tokio::spawn(async move {
            outcome.success(User::new("u-1"), None);
            tokio::task::yield_now().await;
            outcome.fail("second");
        });
    }
}

async fn authenticate(authenticator: &Authenticator) -> sesame_bridge::Result<AuthResponse> {
    authenticator
        .authenticate(request(), &AuthenticateOptions::default())
        .await
}

// =============================================================================
// Fallback and short-circuit
// =============================================================================

#[tokio::test]
async fn test_fail_then_success() {
    let user = User::new("u-1").with_token("accessToken", Some("abc".into()));
    let a = scripted("a", Script::fail("bad code"));
    let b = scripted("b", Script::success(user.clone()));

    let response = authenticate(&authenticator(&[a.clone(), b.clone()])).await.unwrap();

    assert_eq!(response, AuthResponse::success(user, None));
    assert_eq!(a.invocations(), 1);
    assert_eq!(b.invocations(), 1);
}

#[tokio::test]
async fn test_error_stops_chain() {
    let a = scripted("a", Script::Error("directory unavailable".into()));
    let b = scripted("b", Script::success(User::new("u-1")));

    let err = authenticate(&authenticator(&[a.clone(), b.clone()])).await.unwrap_err();

    match err {
        BridgeError::StrategyError { strategy, message } => {
            assert_eq!(strategy, "a");
            assert_eq!(message, "directory unavailable");
        }
        other => panic!("Expected StrategyError, got {:?}", other),
    }
    assert_eq!(b.invocations(), 0);
}

#[tokio::test]
async fn test_pass_then_redirect_defaults_302() {
    let a = scripted("a", Script::Pass);
    let b = scripted("b", Script::redirect("https://idp/authorize"));

    let response = authenticate(&authenticator(&[a, b])).await.unwrap();

    assert_eq!(
        response,
        AuthResponse::Redirect(Redirect {
            url: "https://idp/authorize".into(),
            status: 302,
        })
    );
}

#[tokio::test]
async fn test_redirect_keeps_explicit_status() {
    let a = scripted(
        "a",
        Script::Redirect {
            url: "https://idp/authorize".into(),
            status: Some(307),
        },
    );

    let response = authenticate(&authenticator(&[a])).await.unwrap();
    assert!(matches!(response, AuthResponse::Redirect(Redirect { status: 307, .. })));
}

#[tokio::test]
async fn test_success_short_circuits() {
    let a = scripted("a", Script::success(User::new("first")));
    let b = scripted("b", Script::success(User::new("second")));

    let response = authenticate(&authenticator(&[a, b.clone()])).await.unwrap();

    let AuthResponse::Success(success) = response else {
        panic!("Expected success");
    };
    assert_eq!(success.user.provider_id, "first");
    assert_eq!(b.invocations(), 0);
}

#[tokio::test]
async fn test_all_decline_exhausts() {
    let a = scripted("a", Script::fail("nope"));
    let b = scripted("b", Script::Pass);

    let err = authenticate(&authenticator(&[a, b])).await.unwrap_err();

    match err {
        BridgeError::ExhaustedStrategies { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].strategy, "a");
            assert_eq!(
                attempts[0].outcome,
                AttemptOutcome::Failed {
                    challenge: Some("nope".into()),
                    status: 401,
                }
            );
            assert_eq!(attempts[1].outcome, AttemptOutcome::Passed);
        }
        other => panic!("Expected ExhaustedStrategies, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_list_exhausts_without_invoking() {
    let err = Authenticator::new(Vec::new())
        .authenticate(request(), &AuthenticateOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::ExhaustedStrategies { attempts } if attempts.is_empty()));
}

// =============================================================================
// Token sanitization
// =============================================================================

#[tokio::test]
async fn test_empty_tokens_removed() {
    let user = User::new("u-1")
        .with_token("access", Some(String::new()))
        .with_token("refresh", Some("xyz".into()));
    let a = scripted("a", Script::success(user));

    let AuthResponse::Success(success) = authenticate(&authenticator(&[a])).await.unwrap() else {
        panic!("Expected success");
    };

    assert_eq!(
        success.user.tokens,
        BTreeMap::from([("refresh".to_string(), "xyz".to_string())])
    );
}

#[tokio::test]
async fn test_info_json_encoded() {
    let a = scripted(
        "a",
        Script::Success {
            user: User::new("u-1"),
            info: Some(json!({ "provider": "github" })),
        },
    );

    let AuthResponse::Success(success) = authenticate(&authenticator(&[a])).await.unwrap() else {
        panic!("Expected success");
    };
    assert_eq!(success.info.as_deref(), Some(r#"{"provider":"github"}"#));
}

// =============================================================================
// Contract violations
// =============================================================================

#[tokio::test]
async fn test_silent_strategy_is_error() {
    let a = scripted("a", Script::Silent);
    let b = scripted("b", Script::success(User::new("u-1")));

    let err = authenticate(&authenticator(&[a, b.clone()])).await.unwrap_err();

    assert!(matches!(err, BridgeError::StrategyError { ref strategy, .. } if strategy == "a"));
    assert_eq!(b.invocations(), 0);
}

#[tokio::test]
async fn test_double_report_is_error() {
    let a = scripted(
        "a",
        Script::Sequence(vec![Script::success(User::new("u-1")), Script::fail("late")]),
    );

    let err = authenticate(&authenticator(&[a])).await.unwrap_err();
    assert!(matches!(err, BridgeError::StrategyError { .. }));
}

#[tokio::test]
async fn test_double_report_from_spawned_task_is_error() {
    let authenticator = AuthenticatorBuilder::new()
        .with_strategy(LateSecondReport)
        .build()
        .unwrap();

    let err = authenticate(&authenticator).await.unwrap_err();

    match err {
        BridgeError::StrategyError { strategy, message } => {
            assert_eq!(strategy, "late");
            assert!(message.contains("2 outcomes"), "unexpected message: {}", message);
        }
        other => panic!("Expected StrategyError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_report_from_spawned_task() {
    let a = Arc::new(
        ScriptedStrategy::new("a", Script::redirect("https://idp/authorize"))
            .with_delay(Duration::from_millis(5))
            .spawned(),
    );

    let response = authenticate(&authenticator(&[a])).await.unwrap();
    assert!(response.is_redirect());
}

// =============================================================================
// Timeouts
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_timeout_counts_as_fail() {
    let slow = Arc::new(
        ScriptedStrategy::new("slow", Script::success(User::new("late")))
            .with_delay(Duration::from_secs(3600)),
    );
    let fast = scripted("fast", Script::success(User::new("fast")));

    let authenticator = AuthenticatorBuilder::new()
        .with_shared_strategy(slow)
        .with_shared_strategy(fast)
        .with_attempt_timeout(Duration::from_secs(1))
        .build()
        .unwrap();

    let AuthResponse::Success(success) = authenticate(&authenticator).await.unwrap() else {
        panic!("Expected success");
    };
    assert_eq!(success.user.provider_id, "fast");
}

#[tokio::test(start_paused = true)]
async fn test_timeout_recorded_in_exhaustion() {
    let slow = Arc::new(
        ScriptedStrategy::new("slow", Script::Pass).with_delay(Duration::from_secs(3600)),
    );

    let authenticator = AuthenticatorBuilder::new()
        .with_shared_strategy(slow)
        .with_attempt_timeout(Duration::from_millis(10))
        .build()
        .unwrap();

    match authenticate(&authenticator).await.unwrap_err() {
        BridgeError::ExhaustedStrategies { attempts } => {
            assert_eq!(attempts.len(), 1);
            assert_eq!(attempts[0].outcome, AttemptOutcome::TimedOut);
        }
        other => panic!("Expected ExhaustedStrategies, got {:?}", other),
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_are_independent() {
    let redirect = Arc::new(
        ScriptedStrategy::new("idp", Script::redirect("https://idp/authorize"))
            .with_delay(Duration::from_millis(2))
            .spawned(),
    );
    let authenticator = Arc::new(authenticator(&[redirect.clone()]));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let authenticator = authenticator.clone();
            tokio::spawn(async move {
                authenticator
                    .authenticate(request(), &AuthenticateOptions::default())
                    .await
            })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response, AuthResponse::redirect("https://idp/authorize", None));
    }
    assert_eq!(redirect.invocations(), 32);
}
