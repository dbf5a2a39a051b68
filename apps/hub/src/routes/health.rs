//! Health check HTTP route handlers
//!
//! - `GET /health` - Fixed `ok` body for liveness probing
//! - `GET /health/live` - JSON liveness probe with version
//! - `GET /health/ready` - Readiness with the current session count

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};

use crate::websocket::SessionRegistry;

/// Shared state for health check handlers
#[derive(Clone)]
pub struct HealthState {
    pub registry: SessionRegistry,
}

impl HealthState {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness_probe))
        .route("/ready", get(readiness_probe))
        .with_state(state)
}

/// Simple health check - always returns `ok` while the process is serving
async fn simple_health() -> &'static str {
    "ok"
}

async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe
///
/// The hub has no external dependencies, so it is ready whenever it can
/// answer; the session count is reported for operators.
async fn readiness_probe(State(state): State<HealthState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ready",
        "sessions": state.registry.session_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_simple_health() {
        let response = simple_health().await;
        assert_eq!(response, "ok");
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let response = liveness_probe().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
