//! HTTP Tests for the Gateway
//!
//! These tests drive the router in-process and verify:
//! - Wire response envelopes for redirect and success
//! - Route gate enforcement ahead of the bridge
//! - Error category to status mapping
//! - Health and readiness reporting

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use sesame_bridge::strategies::{Script, ScriptedStrategy};
use sesame_bridge::AuthenticatorBuilder;
use sesame_core::{RouteGate, RouteId, User};
use sesame_gateway::{build_state, create_router, AppState, GatewayConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

// =============================================================================
// Test Helpers
// =============================================================================

const SECRET: &str = "gateway-test-secret";

/// Router over scripted strategies, with only `login-get` enabled
fn scripted_app(scripts: Vec<(&str, Script)>) -> Router {
    let authenticator = scripts
        .into_iter()
        .fold(AuthenticatorBuilder::new(), |builder, (name, script)| {
            builder.with_strategy(ScriptedStrategy::new(name, script))
        })
        .build()
        .expect("Failed to build authenticator");

    create_router(Arc::new(AppState {
        authenticator,
        routes: RouteGate::allow([RouteId::LoginGet]),
        config: GatewayConfig::default(),
    }))
}

/// Router built from environment-style configuration
fn configured_app() -> Router {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("SESAME_NAME", "test-gateway"),
        ("SESAME_ROUTES", "login-get=true,login-post=true,user-create=false"),
        ("SESAME_BEARER_SECRET", SECRET),
        ("SESAME_CREDENTIALS", "alice:wonderland:alice@example.com"),
    ]);
    let config = GatewayConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("Failed to read configuration");

    create_router(build_state(config).expect("Failed to build state"))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

async fn post_auth(app: Router, envelope: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/v1/auth", Some(envelope)).await
}

// =============================================================================
// Authenticate
// =============================================================================

#[tokio::test]
async fn test_redirect_envelope() {
    let app = scripted_app(vec![
        ("a", Script::Pass),
        ("b", Script::redirect("https://idp.example.com/authorize")),
    ]);

    let (status, body) = post_auth(
        app,
        json!({ "method": "GET", "url": "/login", "route": "login-get" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "redirect": { "url": "https://idp.example.com/authorize", "status": 302 } })
    );
}

#[tokio::test]
async fn test_success_envelope_sanitized() {
    let user = User::new("u-1")
        .with_token("access", Some(String::new()))
        .with_token("refresh", Some("xyz".into()))
        .with_token("id", None);
    let app = scripted_app(vec![(
        "a",
        Script::Success {
            user,
            info: Some(json!({ "scopes": ["read"] })),
        },
    )]);

    let (status, body) = post_auth(app, json!({ "method": "GET", "url": "/callback" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"]["user"]["providerId"], json!("u-1"));
    assert_eq!(body["success"]["user"]["tokens"], json!({ "refresh": "xyz" }));
    assert_eq!(body["success"]["info"], json!(r#"{"scopes":["read"]}"#));
}

#[tokio::test]
async fn test_exhaustion_is_unauthenticated() {
    let app = scripted_app(vec![("a", Script::fail("bad code")), ("b", Script::Pass)]);

    let (status, body) = post_auth(app, json!({ "method": "GET", "url": "/login" })).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], json!("UNAUTHENTICATED"));
    assert_eq!(body["error"], json!("All strategies have failed"));
    assert_eq!(
        body["details"]["attempts"],
        json!([
            { "strategy": "a", "outcome": "failed", "challenge": "bad code", "status": 401 },
            { "strategy": "b", "outcome": "passed" }
        ])
    );
}

#[tokio::test]
async fn test_strategy_error_is_failed_precondition() {
    let app = scripted_app(vec![
        ("a", Script::Error("directory unavailable".into())),
        ("b", Script::success(User::new("u-1"))),
    ]);

    let (status, body) = post_auth(app, json!({ "method": "GET", "url": "/login" })).await;

    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(body["code"], json!("FAILED_PRECONDITION"));
    assert_eq!(body["details"]["strategy"], json!("a"));
}

#[tokio::test]
async fn test_invalid_envelope_is_invalid_argument() {
    let app = scripted_app(vec![("a", Script::Pass)]);

    let (status, body) =
        post_auth(app, json!({ "method": "GET", "url": "https://evil.example.com/" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn test_malformed_header_values_is_invalid_argument() {
    let app = scripted_app(vec![("a", Script::Pass)]);

    let (status, body) = post_auth(
        app,
        json!({ "method": "GET", "url": "/login", "headers": { "x-foo": "a" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
    assert!(body["error"].as_str().unwrap().starts_with("Invalid argument:"));
}

#[tokio::test]
async fn test_missing_method_is_invalid_argument() {
    let app = scripted_app(vec![("a", Script::Pass)]);

    let (status, body) = post_auth(app, json!({ "url": "/login" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn test_non_json_body_is_invalid_argument() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = scripted_app(vec![("a", Script::Pass)])
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn test_disabled_route_skips_bridge() {
    let strategy = Arc::new(ScriptedStrategy::new("a", Script::redirect("https://idp/authorize")));
    let authenticator = AuthenticatorBuilder::new()
        .with_shared_strategy(strategy.clone())
        .build()
        .unwrap();
    let app = create_router(Arc::new(AppState {
        authenticator,
        routes: RouteGate::allow([RouteId::LoginGet]),
        config: GatewayConfig::default(),
    }));

    let (status, body) = post_auth(
        app,
        json!({ "method": "POST", "url": "/users", "route": "user-create" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!("NOT_FOUND"));
    assert_eq!(body["details"]["route"], json!("user-create"));
    assert_eq!(strategy.invocations(), 0);
}

#[tokio::test]
async fn test_unknown_route_is_invalid_argument() {
    let app = scripted_app(vec![("a", Script::Pass)]);

    let (status, _) = post_auth(
        app,
        json!({ "method": "GET", "url": "/logout", "route": "logout" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Configured strategies
// =============================================================================

#[tokio::test]
async fn test_basic_credentials_from_config() {
    let credentials = STANDARD.encode("alice:wonderland");

    let (status, body) = post_auth(
        configured_app(),
        json!({
            "method": "POST",
            "url": "/login",
            "route": "login-post",
            "headers": { "Authorization": [format!("Basic {}", credentials)] }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"]["user"]["providerId"], json!("alice"));
    assert_eq!(body["success"]["user"]["emailAddress"], json!("alice@example.com"));
}

#[tokio::test]
async fn test_bearer_token_from_config() {
    let claims = json!({
        "sub": "user-123",
        "exp": (Utc::now() + chrono::Duration::hours(1)).timestamp(),
        "preferred_username": "testtestington"
    });
    let jwt = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let (status, body) = post_auth(
        configured_app(),
        json!({
            "method": "GET",
            "url": "/login",
            "headers": { "authorization": { "value": [format!("Bearer {}", jwt)] } }
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"]["user"]["providerId"], json!("user-123"));
    assert_eq!(body["success"]["user"]["tokens"]["accessToken"], json!(jwt));
}

#[tokio::test]
async fn test_wrong_password_exhausts() {
    let (status, body) = post_auth(
        configured_app(),
        json!({
            "method": "POST",
            "url": "/login",
            "body": r#"{"username":"alice","password":"nope"}"#
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let attempts = body["details"]["attempts"].as_array().unwrap();
    assert_eq!(attempts[0]["strategy"], json!("bearer"));
    assert_eq!(attempts[0]["outcome"], json!("passed"));
    assert_eq!(attempts[1]["strategy"], json!("basic"));
    assert_eq!(attempts[1]["outcome"], json!("failed"));
}

// =============================================================================
// Route gate
// =============================================================================

#[tokio::test]
async fn test_route_enabled() {
    let (status, body) = send(
        configured_app(),
        Method::POST,
        "/v1/routes/enabled",
        Some(json!({ "route": "ROUTE_LOGIN_GET" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "route": "login-get", "enabled": true }));

    let (_, body) = send(
        configured_app(),
        Method::POST,
        "/v1/routes/enabled",
        Some(json!({ "route": "callback-get" })),
    )
    .await;
    assert_eq!(body["enabled"], json!(false));
}

#[tokio::test]
async fn test_route_enabled_unknown_route() {
    let (status, body) = send(
        configured_app(),
        Method::POST,
        "/v1/routes/enabled",
        Some(json!({ "route": "logout" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn test_route_enabled_missing_field() {
    let (status, body) = send(
        configured_app(),
        Method::POST,
        "/v1/routes/enabled",
        Some(json!({ "name": "login-get" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("INVALID_ARGUMENT"));
}

#[tokio::test]
async fn test_list_routes() {
    let (status, body) = send(configured_app(), Method::GET, "/v1/routes", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "routes": {
                "login-get": true,
                "login-post": true,
                "callback-get": false,
                "user-create": false
            }
        })
    );
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = send(configured_app(), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
}

#[tokio::test]
async fn test_ready_reports_strategies() {
    let (status, body) = send(configured_app(), Method::GET, "/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], json!(true));
    assert_eq!(body["name"], json!("test-gateway"));
    assert_eq!(body["strategies"], json!(["bearer", "basic"]));
    assert_eq!(body["attempt_timeout_ms"], json!(30_000));
}

#[tokio::test]
async fn test_ready_saturates_huge_timeout() {
    let authenticator = AuthenticatorBuilder::new()
        .with_strategy(ScriptedStrategy::new("a", Script::Pass))
        .with_attempt_timeout(Duration::MAX)
        .build()
        .unwrap();
    let app = create_router(Arc::new(AppState {
        authenticator,
        routes: RouteGate::default(),
        config: GatewayConfig::default(),
    }));

    let (status, body) = send(app, Method::GET, "/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attempt_timeout_ms"], json!(u64::MAX));
}
