//! Stream consumer
//!
//! Listens on a TCP port for line-delimited JSON update envelopes, one
//! record per line:
//!
//! ```text
//! {"kind": "tag", "service": "server", "key": "hostname-1234", "tags": ["server-state:live"]}
//! {"kind": "metric", "service": "server", "key": "hostname-1234", "metrics": ["server.hostname-1234.cpu"]}
//! ```
//!
//! Each connection gets its own task. Undecodable lines are logged and
//! skipped; the connection keeps reading. The accept loop and every
//! connection task exit when the shutdown channel fires.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config;
use crate::consumer::{Consumer, ConsumerError, Update};
use crate::database::Database;

/// Stream consumer configuration, loaded from its own TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Address to listen on for producer connections.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8071".to_string()
}

/// TCP line-delimited JSON ingestion adapter.
pub struct StreamConsumer {
    config: StreamConfig,
}

impl StreamConsumer {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Load configuration from `path` and build the consumer.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConsumerError> {
        Ok(Self::new(config::read(path.as_ref())?))
    }
}

#[async_trait]
impl Consumer for StreamConsumer {
    fn name(&self) -> &str {
        "stream"
    }

    async fn start(
        &self,
        db: Arc<Database>,
        shutdown: broadcast::Sender<()>,
    ) -> Result<Vec<JoinHandle<()>>, ConsumerError> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "stream consumer listening");

        let mut accept_shutdown = shutdown.subscribe();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = accept_shutdown.recv() => {
                        tracing::info!(addr = %local_addr, "stream consumer shutting down");
                        break;
                    }
                    accepted = listener.accept() => {
                        match accepted {
                            Ok((socket, peer)) => {
                                let db = Arc::clone(&db);
                                let conn_shutdown = shutdown.subscribe();
                                tokio::spawn(async move {
                                    read_records(socket, peer, db, conn_shutdown).await;
                                });
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "stream consumer accept error");
                                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                            }
                        }
                    }
                }
            }
        });

        Ok(vec![handle])
    }
}

/// Read update envelopes off one connection until EOF or shutdown.
async fn read_records(
    socket: TcpStream,
    peer: SocketAddr,
    db: Arc<Database>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::debug!(peer = %peer, "producer connected");
    let mut lines = BufReader::new(socket).lines();

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<Update>(&line) {
                            Ok(update) => {
                                if let Err(e) = update.apply(&db) {
                                    tracing::warn!(peer = %peer, error = %e, "dropping rejected update record");
                                }
                            }
                            Err(e) => {
                                tracing::warn!(peer = %peer, error = %e, "dropping undecodable update record");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(peer = %peer, error = %e, "producer connection error");
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!(peer = %peer, "producer disconnected");
}
