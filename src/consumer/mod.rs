//! Ingestion Adapters
//!
//! Adapters own the transport: they decode whatever arrives on the wire
//! into one of three update-record shapes and hand the records to the
//! database. A record that fails to decode is logged and dropped; it never
//! poisons the adapter. Adapters stop producing when the process-wide
//! shutdown channel fires.
//!
//! Two adapters ship in-tree:
//!
//! - [`StreamConsumer`]: TCP listener reading line-delimited JSON
//!   envelopes.
//! - [`HttpApiConsumer`]: push endpoints accepting the record shapes as
//!   JSON bodies.

pub mod httpapi;
pub mod stream;

pub use httpapi::HttpApiConsumer;
pub use stream::StreamConsumer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::ConfigError;
use crate::database::{Database, DatabaseError};

/// Join-key → metrics association for one service's split index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMetric {
    pub service: String,
    pub key: String,
    pub metrics: Vec<String>,
}

/// Join-key → tags association for one service's split index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTag {
    pub service: String,
    pub key: String,
    pub tags: Vec<String>,
}

/// Free-form tags → metrics association for the full index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagMetric {
    pub tags: Vec<String>,
    pub metrics: Vec<String>,
}

/// Wire envelope carried by the stream consumer: a record tagged with its
/// kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Update {
    Metric(KeyMetric),
    Tag(KeyTag),
    Custom(TagMetric),
}

impl Update {
    /// Route the record to the database.
    pub fn apply(&self, db: &Database) -> Result<(), DatabaseError> {
        match self {
            Update::Metric(msg) => db.insert_metrics(msg),
            Update::Tag(msg) => db.insert_tags(msg),
            Update::Custom(msg) => db.insert_custom(msg),
        }
    }
}

/// Adapter startup failures. Decode errors at runtime are not errors at
/// this level; they are logged and dropped by the adapter.
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("consumer IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Common contract for ingestion adapters.
///
/// `start` binds the adapter's transport and spawns its long-lived worker
/// tasks, returning their handles so the process can join them at
/// shutdown. Workers subscribe to the shutdown channel and exit when it
/// fires.
#[async_trait]
pub trait Consumer: Send + Sync {
    fn name(&self) -> &str;

    async fn start(
        &self,
        db: Arc<Database>,
        shutdown: broadcast::Sender<()>,
    ) -> Result<Vec<JoinHandle<()>>, ConsumerError>;
}
