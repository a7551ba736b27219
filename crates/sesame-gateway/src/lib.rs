//! Sesame Gateway
//!
//! JSON-over-HTTP boundary in front of the strategy bridge. A web server
//! describes each inbound request as a wire envelope; the gateway answers
//! with a redirect to an identity provider or an authenticated user.
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /ready` - Readiness check with configured strategies
//! - `POST /v1/auth` - Authenticate a request envelope
//! - `POST /v1/routes/enabled` - Whether a logical route is enabled
//! - `GET /v1/routes` - Enablement of every known route
//!
//! ## Error Mapping
//!
//! | error | status |
//! |---|---|
//! | invalid envelope or unknown route | 400 |
//! | disabled route | 404 |
//! | strategy error | 412 |
//! | every strategy declined | 401 |
//! | anything else | 500 |

pub mod api;
pub mod config;

pub use api::create_router;
pub use api::error::ApiError;
pub use api::handlers::AppState;
pub use config::{ConfigError, CredentialEntry, GatewayConfig};

use std::sync::Arc;

/// Build the shared application state from configuration
pub fn build_state(config: GatewayConfig) -> Result<Arc<AppState>, ConfigError> {
    let authenticator = config.authenticator()?;
    let routes = config.route_gate();

    Ok(Arc::new(AppState {
        authenticator,
        routes,
        config,
    }))
}
