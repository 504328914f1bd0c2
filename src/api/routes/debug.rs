//! Debug Route
//!
//! `GET /debug/vars` exposes the telemetry snapshot: message and index
//! counters, query counts, and the per-index size maps.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::api::state::AppState;
use crate::stats::StatsSnapshot;

/// GET /debug/vars
pub async fn vars(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.db.stats().snapshot())
}
