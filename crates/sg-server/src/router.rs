//! Root router assembly.
//!
//! Liveness endpoints live at the server root; the bridge endpoints are
//! mounted under the configured base path so the server can sit behind a
//! gateway that routes by prefix.

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use sg_bridge::{bridge_router, BridgeState};
use tower_http::trace::TraceLayer;

/// Creates the application router.
pub fn create_router(base_path: &str, state: BridgeState) -> Router {
    let health = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check));

    let bridge = bridge_router(state);

    // Nesting at "/" is rejected by axum; merge in that case.
    let app = if base_path.is_empty() || base_path == "/" {
        health.merge(bridge)
    } else {
        health.nest(base_path, bridge)
    };

    app.layer(TraceLayer::new_for_http())
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// Readiness probe.
async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
