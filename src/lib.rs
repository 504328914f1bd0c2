//! # Atlas
//!
//! Tag-driven metric-name discovery over a virtual namespace. Producers
//! publish associations of tags to join keys ("host server-state:live →
//! hostname-1234") and of join keys to metric names ("hostname-1234 →
//! server.hostname-1234.cpu.i7z"); clients ask for every metric matching a
//! conjunction of tags and atlas joins the two sides through the join key.
//! A second mode stores direct tag → metric associations for the "custom"
//! service.
//!
//! ## Modules
//!
//! - [`fingerprint`]: 64-bit fingerprints and the fingerprint → string table
//! - [`tag`]: `service-key:value` tag parsing
//! - [`index`]: the split and full index structures
//! - [`database`]: index registry, update routing, cross-service queries
//! - [`query`]: virtual query parsing
//! - [`consumer`]: ingestion adapters (TCP stream, HTTP push)
//! - [`api`]: HTTP query surface with Axum
//! - [`stats`]: process telemetry for the debug endpoint
//!
//! ## Quick Start
//!
//! ```rust
//! use atlas::consumer::{KeyMetric, KeyTag};
//! use atlas::database::Database;
//! use atlas::stats::Stats;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(10_000, Arc::new(Stats::new()));
//!
//! db.insert_metrics(&KeyMetric {
//!     service: "server".to_string(),
//!     key: "hostname-1234".to_string(),
//!     metrics: vec!["server.hostname-1234.cpu.i7z".to_string()],
//! })?;
//! db.insert_tags(&KeyTag {
//!     service: "server".to_string(),
//!     key: "hostname-1234".to_string(),
//!     tags: vec!["server-state:live".to_string()],
//! })?;
//!
//! let mut query = HashMap::new();
//! query.insert("server".to_string(), vec!["server-state:live".to_string()]);
//!
//! let metrics = db.query(&query)?;
//! assert_eq!(metrics, vec!["server.hostname-1234.cpu.i7z".to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod consumer;
pub mod database;
pub mod fingerprint;
pub mod index;
pub mod query;
pub mod stats;
pub mod tag;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};

pub use consumer::{
    Consumer, ConsumerError, HttpApiConsumer, KeyMetric, KeyTag, StreamConsumer, TagMetric, Update,
};

pub use database::{Database, DatabaseError, CUSTOM_SERVICE};

pub use fingerprint::{
    hash_join, hash_metric, hash_metrics, hash_tag, hash_tags, JoinFp, MetricFp, StringTable, TagFp,
};

pub use index::{FullIndex, IndexError, SplitIndex};

pub use query::{parse_query, QueryError, DEFAULT_PREFIX};

pub use stats::{Stats, StatsSnapshot};

pub use tag::TagError;
