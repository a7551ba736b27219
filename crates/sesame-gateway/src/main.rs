//! Sesame Gateway Binary
//!
//! Runs the authentication gateway HTTP server.

use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sesame_gateway::{build_state, create_router, GatewayConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Configuration
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(Level::INFO);
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_level);

    let port = config.port;
    let state = match build_state(config) {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to initialize gateway");
            return ExitCode::FAILURE;
        }
    };

    info!(
        name = ?state.config.name,
        strategies = ?state.authenticator.strategy_names(),
        routes = ?state.routes.table(),
        port = port,
        "Starting sesame gateway"
    );

    let app = create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "Failed to bind to address");
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %addr, "Sesame gateway listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}
