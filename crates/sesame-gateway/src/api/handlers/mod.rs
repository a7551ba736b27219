//! API request handlers

pub mod auth;
pub mod routes;

pub use auth::{authenticate, AppState, AuthenticateRequest};
pub use routes::{
    list_routes, route_enabled, ListRoutesResponse, RouteEnabledRequest, RouteEnabledResponse,
};
