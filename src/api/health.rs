//! Health check endpoints for orchestrator probes

use axum::{http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::api::types::Json;

/// Health response body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

/// Returns 200 with the crate version while the process is serving
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Bare liveness probe
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}
