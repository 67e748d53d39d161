//! Health Check Handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::core::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Status (healthy | degraded)
    status: &'static str,
    /// Server version
    version: &'static str,
    /// Runtime environment
    environment: String,
}

/// GET /api/v2/health - liveness probe
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
    })
}
