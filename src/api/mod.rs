//! Atlas Query API
//!
//! HTTP surface for the index, built with Axum.
//!
//! # Endpoints
//!
//! ## Query
//! - `GET /metrics/find/?query=<virtual-query>&format=<protobuf|json>`
//!
//! ## Debug
//! - `GET /debug/vars` - Telemetry snapshot
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//!
//! Queries run on request-scoped tasks against the shared database; the
//! server drains in-flight requests on shutdown.

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        // Trailing-slash form is canonical; accept both.
        .route("/metrics/find/", get(routes::find::find))
        .route("/metrics/find", get(routes::find::find))
        .route("/debug/vars", get(routes::debug::vars))
        .route("/health/live", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server; returns once the shutdown channel fires and
/// in-flight requests have drained.
pub async fn serve(state: AppState, shutdown: broadcast::Sender<()>) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("atlas API listening on {}", addr);

    let mut shutdown_rx = shutdown.subscribe();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| ApiError::Internal(format!("server error: {e}")))?;

    tracing::info!("atlas API shut down gracefully");
    Ok(())
}
