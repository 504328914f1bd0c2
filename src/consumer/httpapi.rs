//! HTTP push consumer
//!
//! A small push API for producers that would rather POST than stream:
//!
//! - `POST /consumer/metrics` with a [`KeyMetric`] body
//! - `POST /consumer/tags` with a [`KeyTag`] body
//! - `POST /consumer/custom` with a [`TagMetric`] body
//!
//! Runs its own listener on its own port, separate from the query surface.
//! Malformed bodies get a 400 and a log line; the adapter keeps serving.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config;
use crate::consumer::{Consumer, ConsumerError, KeyMetric, KeyTag, TagMetric};
use crate::database::Database;

/// HTTP push consumer configuration, loaded from its own TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpApiConfig {
    /// Address to listen on for producer requests.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8072".to_string()
}

/// HTTP push ingestion adapter.
pub struct HttpApiConsumer {
    config: HttpApiConfig,
}

impl HttpApiConsumer {
    pub fn new(config: HttpApiConfig) -> Self {
        Self { config }
    }

    /// Load configuration from `path` and build the consumer.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConsumerError> {
        Ok(Self::new(config::read(path.as_ref())?))
    }
}

/// Build the push router; split out so tests can drive it directly.
pub fn router(db: Arc<Database>) -> Router {
    Router::new()
        .route("/consumer/metrics", post(push_metrics))
        .route("/consumer/tags", post(push_tags))
        .route("/consumer/custom", post(push_custom))
        .with_state(db)
}

#[async_trait]
impl Consumer for HttpApiConsumer {
    fn name(&self) -> &str {
        "httpapi"
    }

    async fn start(
        &self,
        db: Arc<Database>,
        shutdown: broadcast::Sender<()>,
    ) -> Result<Vec<JoinHandle<()>>, ConsumerError> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "httpapi consumer listening");

        let app = router(db);
        let mut shutdown_rx = shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            });
            if let Err(e) = serve.await {
                tracing::error!(error = %e, "httpapi consumer server error");
            }
            tracing::info!(addr = %local_addr, "httpapi consumer shut down");
        });

        Ok(vec![handle])
    }
}

async fn push_metrics(
    State(db): State<Arc<Database>>,
    payload: Result<Json<KeyMetric>, JsonRejection>,
) -> StatusCode {
    let Json(msg) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable metric record");
            return StatusCode::BAD_REQUEST;
        }
    };

    match db.insert_metrics(&msg) {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(error = %e, "dropping rejected metric record");
            StatusCode::BAD_REQUEST
        }
    }
}

async fn push_tags(
    State(db): State<Arc<Database>>,
    payload: Result<Json<KeyTag>, JsonRejection>,
) -> StatusCode {
    let Json(msg) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable tag record");
            return StatusCode::BAD_REQUEST;
        }
    };

    match db.insert_tags(&msg) {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(error = %e, "dropping rejected tag record");
            StatusCode::BAD_REQUEST
        }
    }
}

async fn push_custom(
    State(db): State<Arc<Database>>,
    payload: Result<Json<TagMetric>, JsonRejection>,
) -> StatusCode {
    let Json(msg) = match payload {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "dropping undecodable custom record");
            return StatusCode::BAD_REQUEST;
        }
    };

    match db.insert_custom(&msg) {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::warn!(error = %e, "dropping rejected custom record");
            StatusCode::BAD_REQUEST
        }
    }
}
