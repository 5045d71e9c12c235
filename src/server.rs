use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::api;
use crate::api::routes::state::AppState;
use crate::error::AlertDeskError;

pub struct WebServer {
    host: String,
    port: u16,
    state: AppState,
}

impl WebServer {
    pub fn new(host: String, port: u16, state: AppState) -> Self {
        Self { host, port, state }
    }

    pub async fn start(self) -> Result<(), AlertDeskError> {
        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AlertDeskError::Error(format!("Invalid address: {}", e)))?;

        let app = create_router(self.state);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AlertDeskError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        log::info!("alertdesk listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AlertDeskError::Error(format!("Server error: {}", e)))?;

        log::info!("Server shutdown complete");
        Ok(())
    }
}

/// Builds the full application router. Browser dashboards call this API
/// cross-origin, so CORS is open to every origin.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Account endpoints
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))

        // Alert endpoints
        .route("/alert", post(api::alerts::create_alert))
        .route("/alerts", get(api::alerts::list_alerts))
        .route("/alert/{alert_id}/acknowledge", post(api::alerts::acknowledge_alert))

        .with_state(state)
        .layer(cors)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Waits for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received SIGINT (Ctrl+C)");
        },
        _ = terminate => {
            log::info!("Received SIGTERM");
        },
    }
}
