//! Atlas server
//!
//! Run with: `atlas --config config.toml`
//!
//! Loads the config, starts the configured ingestion consumers, serves the
//! query API, and shuts everything down together on SIGINT/SIGTERM.
//!
//! Exit codes: 0 on clean shutdown, 1 on startup error, 64 on usage error.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atlas::api::{self, ApiConfig, AppState};
use atlas::config::Config;
use atlas::consumer::{Consumer, HttpApiConsumer, StreamConsumer};
use atlas::database::Database;
use atlas::query::DEFAULT_PREFIX;
use atlas::stats::Stats;

#[derive(Parser, Debug)]
#[command(name = "atlas", version, about = "Tag-driven metric-name discovery service")]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Virtual-namespace prefix queries must carry
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(64);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_with_env(&args.config)?;

    init_tracing(&config);
    tracing::info!("starting atlas v{}", env!("CARGO_PKG_VERSION"));

    if config.consumers.is_empty() {
        return Err(format!(
            "config {:?} has no consumers; atlas would have nothing to search on",
            args.config
        )
        .into());
    }

    let stats = Arc::new(Stats::new());
    let db = Arc::new(Database::new(config.result_limit, Arc::clone(&stats)));

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let mut consumers: Vec<Box<dyn Consumer>> = Vec::new();
    for (name, consumer_config) in &config.consumers {
        let consumer: Box<dyn Consumer> = match name.as_str() {
            "stream" => Box::new(StreamConsumer::from_config_file(consumer_config)?),
            "httpapi" => Box::new(HttpApiConsumer::from_config_file(consumer_config)?),
            other => {
                return Err(format!(
                    "unknown consumer {other:?} in config; known consumers are 'stream' and 'httpapi'"
                )
                .into())
            }
        };
        consumers.push(consumer);
    }

    let mut workers = Vec::new();
    for consumer in &consumers {
        let handles = consumer
            .start(Arc::clone(&db), shutdown_tx.clone())
            .await?;
        tracing::info!(consumer = consumer.name(), "consumer started");
        workers.extend(handles);
    }

    // Translate OS signals into the shared shutdown channel; the API server
    // and every consumer worker subscribe to it.
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, shutting down");
        let _ = signal_tx.send(());
    });

    let api_config = ApiConfig {
        host: "0.0.0.0".to_string(),
        port: config.port,
        query_limit: config.query_limit,
        prefix: args.prefix,
    };
    api::serve(AppState::new(Arc::clone(&db), api_config), shutdown_tx).await?;

    for worker in workers {
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "consumer worker ended abnormally");
        }
    }

    tracing::info!("atlas shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber from the logging config; `RUST_LOG`
/// wins when set.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("atlas={}", config.logging.level))
    });

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
