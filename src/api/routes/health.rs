//! Health Routes
//!
//! Liveness and readiness probes. The index lives entirely in memory and
//! is ready as soon as the process serves requests, so readiness mirrors
//! liveness; both exist so deployment tooling has the endpoints it
//! expects.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
}

/// GET /health/live
pub async fn liveness(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
    })
}

/// GET /health/ready
pub async fn readiness(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.uptime_seconds(),
    })
}
