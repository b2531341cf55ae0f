//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the route entrypoint and install routes for the active mode
//! - Bind the listener and begin accepting traffic
//! - Hand back a handle that can stop the server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Production: routes are installed before the listener is bound, so a bad
//!   entrypoint never opens a socket
//! - Development: routes are installed after the server has started, and a bad
//!   entrypoint stops the server again before returning the error

use std::net::SocketAddr;
use std::sync::Arc;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::assets::StaticFiles;
use crate::config::{bind_target_from_env, BridgeConfig, ConfigError, Mode};
use crate::dispatch::CatchAll;
use crate::entry::{load_entrypoint, EntryError, Registrar};
use crate::host::{host_pipeline, DevelopmentHost, ProductionHost, RoutingHost};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::render::SsrEngine;
use crate::routing::Routes;

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch route entrypoint: {0}")]
    Watch(#[from] notify::Error),
}

/// A started server.
pub struct RunningServer {
    addr: SocketAddr,
    mode: Mode,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), std::io::Error>>,
    _watcher: Option<RecommendedWatcher>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Stop accepting connections and wait for in-flight requests to drain.
    pub async fn stop(mut self) -> Result<(), std::io::Error> {
        self.shutdown_and_join().await
    }

    async fn shutdown_and_join(&mut self) -> Result<(), std::io::Error> {
        self.shutdown.trigger();
        flatten((&mut self.task).await)
    }

    /// Serve until `signal` resolves, then shut down gracefully.
    pub async fn run_until<F>(mut self, signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => self.shutdown_and_join().await,
            result = &mut self.task => flatten(result),
        }
    }
}

fn flatten(result: Result<Result<(), std::io::Error>, tokio::task::JoinError>) -> Result<(), std::io::Error> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(std::io::Error::other(e)),
    }
}

/// Start the server in the configured mode, routes coming from `config.entry`.
pub async fn start(config: &BridgeConfig, engine: Arc<dyn SsrEngine>) -> Result<RunningServer, StartupError> {
    match config.mode {
        Mode::Production => start_production(config, engine, None).await,
        Mode::Development => start_development(config, engine).await,
    }
}

/// Start a production server.
///
/// Routes come from `registrar` when given, otherwise from `config.entry`.
/// Without either, an error is logged and only the catch-all is served.
pub async fn start_production(
    config: &BridgeConfig,
    engine: Arc<dyn SsrEngine>,
    registrar: Option<&dyn Registrar>,
) -> Result<RunningServer, StartupError> {
    let statics = config
        .assets
        .enabled
        .then(|| StaticFiles::new(&config.assets.client_root, config.assets.prefix.clone()));
    let host = Arc::new(ProductionHost::new(
        CatchAll::new(engine, config.server.body_buffer_chunks),
        statics,
    ));

    // 1. User routes, before any socket exists.
    match (registrar, &config.entry) {
        (Some(registrar), _) => {
            host.install_routes(registrar).await?;
        }
        (None, Some(path)) => {
            let entry = load_entrypoint(path)?;
            host.install_routes(&entry).await?;
        }
        (None, None) => {
            tracing::error!("Set the `entry` file for your server routes");
            host.install_routes(&|_: &mut Routes| {}).await?;
        }
    }

    // 2. Listener.
    let (listener, addr) = bind(config).await?;
    let server = HttpServer::production(config, host);

    Ok(spawn(server, listener, addr, Mode::Production))
}

/// Start a development server around the built-in host pipeline.
pub async fn start_development(
    config: &BridgeConfig,
    engine: Arc<dyn SsrEngine>,
) -> Result<RunningServer, StartupError> {
    let host = Arc::new(DevelopmentHost::new(config.entry.clone()));
    let pipeline = host_pipeline(CatchAll::new(engine, config.server.body_buffer_chunks));
    let server = HttpServer::development(config, &host, pipeline);

    let (listener, addr) = bind(config).await?;
    let mut running = spawn(server, listener, addr, Mode::Development);

    // The host has started; only now are user routes loaded.
    let ready = async {
        host.on_server_start().await?;
        if config.dev.watch_entry {
            running._watcher = host.watch_entry()?;
        }
        Ok::<_, StartupError>(())
    };

    match ready.await {
        Ok(()) => Ok(running),
        Err(e) => {
            if let Err(stop_err) = running.shutdown_and_join().await {
                tracing::warn!(error = %stop_err, "Server did not stop cleanly");
            }
            Err(e)
        }
    }
}

async fn bind(config: &BridgeConfig) -> Result<(TcpListener, SocketAddr), StartupError> {
    let (host, port) = bind_target_from_env(config)?;
    let address = format!("{host}:{port}");

    let listener = TcpListener::bind(address.as_str())
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    let addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address: address.clone(),
        source,
    })?;

    tracing::info!(address = %addr, "Listening on {}:{}", host, addr.port());
    Ok((listener, addr))
}

fn spawn(
    server: HttpServer,
    listener: TcpListener,
    addr: SocketAddr,
    mode: Mode,
) -> RunningServer {
    let shutdown = Shutdown::new();
    let signalled = shutdown.signalled();
    let task = tokio::spawn(server.run(listener, signalled));

    RunningServer {
        addr,
        mode,
        shutdown,
        task,
        _watcher: None,
    }
}
