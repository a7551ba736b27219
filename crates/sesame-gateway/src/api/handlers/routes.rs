//! Route Gate Handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sesame_core::RouteId;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::auth::AppState;
use crate::api::error::ApiError;

/// Request to check one route
#[derive(Debug, Deserialize)]
pub struct RouteEnabledRequest {
    pub route: String,
}

#[derive(Debug, Serialize)]
pub struct RouteEnabledResponse {
    pub route: RouteId,
    pub enabled: bool,
}

/// Enablement of every known route
#[derive(Debug, Serialize)]
pub struct ListRoutesResponse {
    pub routes: BTreeMap<RouteId, bool>,
}

/// Whether a route is enabled
///
/// POST /v1/routes/enabled
pub async fn route_enabled(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteEnabledRequest>, JsonRejection>,
) -> Result<Json<RouteEnabledResponse>, ApiError> {
    let Json(req) = payload?;
    let route: RouteId = req.route.parse()?;

    Ok(Json(RouteEnabledResponse {
        route,
        enabled: state.routes.is_enabled(route),
    }))
}

/// List route enablement
///
/// GET /v1/routes
pub async fn list_routes(State(state): State<Arc<AppState>>) -> Json<ListRoutesResponse> {
    Json(ListRoutesResponse {
        routes: state.routes.table(),
    })
}
