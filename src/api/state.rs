//! Application State
//!
//! Shared state accessible by all API handlers, wrapped in Arc for
//! thread-safe sharing across request tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::database::Database;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Index registry and query engine
    pub db: Arc<Database>,
    /// Query surface configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: ApiConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Query surface configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Maximum number of tags in one query
    pub query_limit: usize,
    /// Virtual-namespace prefix queries must carry
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8070,
            query_limit: 25,
            prefix: crate::query::DEFAULT_PREFIX.to_string(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
