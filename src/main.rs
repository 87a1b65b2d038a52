//! albumstore -- album catalog and object management server.
//!
//! SIGTERM/SIGINT stop accepting connections; in-flight requests get
//! `server.shutdown_timeout` seconds to finish before the process exits.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use albumstore::config::{Config, LoggingConfig};
use albumstore::storage::aws::AwsGateway;
use albumstore::storage::backend::StorageGateway;
use albumstore::storage::memory::MemoryGateway;
use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the albumstore server.
#[derive(Parser, Debug)]
#[command(
    name = "albumstore",
    version,
    about = "Album catalog and object management over an S3 bucket"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "albumstore.yaml")]
    config: String,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = albumstore::config::load_config(&cli.config)?;
    init_tracing(&config.logging);
    info!("Configuration loaded from {}", cli.config);

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    if config.observability.metrics {
        albumstore::metrics::init_metrics()?;
        albumstore::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    let gateway = build_gateway(&config).await?;
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);

    let state = Arc::new(albumstore::AppState::new(config, gateway));
    let app = albumstore::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("albumstore listening on {}", bind_addr);

    let stopping = Arc::new(Notify::new());
    let signalled = stopping.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signalled.notify_one();
        })
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = async {
            stopping.notified().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!("In-flight requests still running after {:?}; exiting", shutdown_timeout);
        }
    }

    info!("albumstore shut down");

    Ok(())
}

/// Install the global subscriber.  `RUST_LOG` wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Build the storage gateway for the configured bucket.
///
/// Without a bucket the server still starts; catalog and management
/// requests then fail with a configuration error.
async fn build_gateway(config: &Config) -> anyhow::Result<Option<Arc<dyn StorageGateway>>> {
    let Some(bucket) = config.bucket() else {
        warn!("No bucket configured; set S3_BUCKET_NAME. API requests will fail until then");
        return Ok(None);
    };

    let gateway: Arc<dyn StorageGateway> = match config.storage.backend.as_str() {
        "aws" => Arc::new(AwsGateway::new(&config.storage.aws, bucket.to_string()).await?),
        "memory" => {
            let memory = &config.storage.memory;
            info!(
                "In-memory storage backend for bucket {} (urls under {})",
                bucket, memory.base_url
            );
            Arc::new(MemoryGateway::new(memory.base_url.clone(), memory.page_size))
        }
        other => anyhow::bail!("unknown storage.backend `{other}` (expected aws or memory)"),
    };
    Ok(Some(gateway))
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
