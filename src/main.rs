//! ssr-bridge
//!
//! Serves server-rendered pages in production or development mode.
//!
//! ```text
//!   Client ──▶ http server ──▶ routing host ──▶ user routes (dispatcher)
//!                                   │                  │ fallthrough + locals
//!                                   │                  ▼
//!                                   │            catch-all render
//!                                   │                  │
//!   Client ◀── streamed body ◀── response bridge ◀─────┘
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use ssr_bridge::config::validation::validate_config;
use ssr_bridge::config::{load_config, BridgeConfig, ConfigError, Mode};
use ssr_bridge::lifecycle::{self, shutdown_signal};
use ssr_bridge::observability::{logging, metrics};
use ssr_bridge::render::PreviewEngine;

const DEFAULT_CONFIG: &str = "ssr-bridge.toml";

#[derive(Parser)]
#[command(name = "ssr-bridge")]
#[command(about = "Server-side rendering bridge for a standalone HTTP host", long_about = None)]
struct Cli {
    /// Config file (defaults to ./ssr-bridge.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Runtime mode: dev or prod
    #[arg(short, long)]
    mode: Option<Mode>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Route manifest to register user routes from
    #[arg(short, long)]
    entry: Option<PathBuf>,
}

impl Cli {
    fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None if Path::new(DEFAULT_CONFIG).exists() => load_config(Path::new(DEFAULT_CONFIG))?,
            None => BridgeConfig::default(),
        };

        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(host) = &self.host {
            config.server.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            config.server.port = Some(port);
        }
        if let Some(entry) = &self.entry {
            config.entry = Some(entry.clone());
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init(&config.observability);
    tracing::info!(mode = %config.mode, "ssr-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let engine = Arc::new(PreviewEngine::new(config.render.title.clone()));
    let server = lifecycle::start(&config, engine).await?;

    server.run_until(shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
