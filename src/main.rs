//! File relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request          ┌──────────────────────────────────────────────┐
//!     ────────────────────────┼─▶ http server ──▶ FileSource::open            │
//!                             │                      │ missing → 500         │
//!                             │                      ▼                       │
//!                             │   RelaySession: ready → read → write         │
//!                             │                      │                       │
//!     Client Response         │                      ▼                       │
//!     ◀───────────────────────┼── response body ◀── ChannelSink (bounded)    │
//!                             └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use file_relay::config::{load_config, validate_config, ConfigError, ServerConfig};
use file_relay::observability::{logging, metrics};
use file_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "file-relay")]
#[command(about = "Stream a file to every HTTP client with backpressure", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File to serve (overrides `source.path`).
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Listen address (overrides `listener.bind_address`).
    #[arg(short, long)]
    bind: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(file) = self.file {
            config.source.path = file;
        }
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level);
    tracing::info!("file-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        source = %config.source.path.display(),
        chunk_size = config.relay.chunk_size,
        channel_capacity = config.relay.channel_capacity,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Already validated.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
