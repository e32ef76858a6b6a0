//! Liveness probe polled by the service directory.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// GET /health: the process is up and serving.
pub async fn check() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}
