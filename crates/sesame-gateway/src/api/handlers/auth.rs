//! Authenticate Handler
//!
//! Runs the strategy bridge over one inbound request envelope.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use sesame_bridge::{AuthenticateOptions, Authenticator};
use sesame_core::{AuthResponse, RouteGate, RouteId, WireRequest};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::config::GatewayConfig;

/// Application state shared across handlers
pub struct AppState {
    /// Strategy bridge over the configured strategies
    pub authenticator: Authenticator,
    /// Route enablement lookup
    pub routes: RouteGate,
    /// Gateway configuration
    pub config: GatewayConfig,
}

/// Request to authenticate
///
/// The wire request envelope, plus the logical route it arrived on and
/// the options passed to every strategy.
#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    #[serde(flatten)]
    pub request: WireRequest,

    /// Logical route; checked against the route gate when present
    #[serde(default)]
    pub route: Option<String>,

    #[serde(default)]
    pub options: AuthenticateOptions,
}

/// Authenticate a request against the configured strategies
///
/// POST /v1/auth
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let Json(req) = payload.map_err(|rejection| {
        warn!(%request_id, error = %rejection.body_text(), "Rejected malformed envelope");
        ApiError::from(rejection)
    })?;

    if let Some(route) = &req.route {
        let route: RouteId = route.parse()?;
        if !state.routes.is_enabled(route) {
            warn!(%request_id, route = %route, "Rejected request on disabled route");
            return Err(ApiError::RouteDisabled(route));
        }
    }

    info!(
        %request_id,
        method = %req.request.method,
        url = %req.request.url,
        route = ?req.route,
        "Authenticating request"
    );

    let response = state
        .authenticator
        .authenticate_wire(&req.request, &req.options)
        .await
        .map_err(|e| {
            warn!(%request_id, error = %e, "Authentication did not settle");
            ApiError::from(e)
        })?;

    info!(%request_id, outcome = response.kind(), "Authentication settled");

    Ok(Json(response))
}
