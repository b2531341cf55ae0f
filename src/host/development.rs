//! Development host: spliced in front of a pipeline it does not own.
//!
//! # Responsibilities
//! - Intercept every request at the front of the host's service stack
//! - Install user routes only once the host server has started
//! - Hand unresolved requests back to the host with their locals attached
//!
//! # Design Decisions
//! - The host's continuation is the wrapped inner service; no side channel on the request
//! - Before routes are installed every request passes straight through
//! - A reload that fails keeps the previous route table

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response};
use axum::Router;
use futures_util::future::BoxFuture;
use notify::RecommendedWatcher;
use tower::{Layer, Service};

use super::RoutingHost;
use crate::dispatch::{CatchAll, Dispatch, Dispatcher};
use crate::entry::{load_entrypoint, EntryError, EntryWatcher, Registrar};
use crate::http::response::handler_error_response;
use crate::locals::LocalsExt;
use crate::routing::{HandlerError, Routes};

/// Routes installed after the host server starts.
#[derive(Debug)]
pub struct DevelopmentHost {
    dispatcher: Dispatcher,
    entry: Option<PathBuf>,
    installs: AtomicUsize,
}

impl DevelopmentHost {
    pub fn new(entry: Option<PathBuf>) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            entry,
            installs: AtomicUsize::new(0),
        }
    }

    pub fn entry(&self) -> Option<&Path> {
        self.entry.as_deref()
    }

    pub fn route_count(&self) -> usize {
        self.dispatcher.route_count()
    }

    /// Number of successful route installations so far.
    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Tower layer placing this host at the front of a service stack.
    pub fn layer(self: &Arc<Self>) -> DevelopmentLayer {
        DevelopmentLayer::new(self.clone())
    }

    /// Load the entrypoint and install its routes.
    ///
    /// Must run after the host server reports it has started. With no entry
    /// configured this logs an error and leaves the table empty.
    pub async fn on_server_start(&self) -> Result<usize, EntryError> {
        let Some(path) = &self.entry else {
            tracing::error!("Set the `entry` file for your server routes");
            return Ok(0);
        };

        let entry = load_entrypoint(path)?;
        let count = self.install_routes(&entry).await?;
        tracing::info!(entry = %path.display(), routes = count, "Development routes set up");
        Ok(count)
    }

    /// Reinstall routes whenever the entry manifest changes.
    ///
    /// Returns `None` when no entry is configured. Dropping the returned
    /// watcher stops reloading.
    pub fn watch_entry(self: &Arc<Self>) -> Result<Option<RecommendedWatcher>, notify::Error> {
        let Some(path) = &self.entry else {
            return Ok(None);
        };

        let (watcher, mut updates) = EntryWatcher::new(path);
        let guard = watcher.run()?;

        let host = self.clone();
        tokio::spawn(async move {
            while let Some(entry) = updates.recv().await {
                match host.install_routes(&entry).await {
                    Ok(count) => tracing::info!(routes = count, "Development routes reloaded"),
                    Err(e) => tracing::error!(error = %e, "Route reload failed, keeping current table"),
                }
            }
        });

        Ok(Some(guard))
    }
}

#[async_trait]
impl RoutingHost for DevelopmentHost {
    async fn install_routes(&self, registrar: &dyn Registrar) -> Result<usize, EntryError> {
        let mut routes = Routes::new();
        registrar.register(&mut routes).await.map_err(EntryError::Register)?;

        let count = routes.len();
        self.dispatcher.install(routes);
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(count)
    }

    async fn dispatch(&self, request: Request<Body>) -> Result<Dispatch, HandlerError> {
        self.dispatcher.dispatch(request).await
    }
}

/// Layer wrapping a host-owned service with a [`RoutingHost`].
#[derive(Clone)]
pub struct DevelopmentLayer {
    host: Arc<dyn RoutingHost>,
}

impl DevelopmentLayer {
    pub fn new(host: Arc<dyn RoutingHost>) -> Self {
        Self { host }
    }
}

impl<S> Layer<S> for DevelopmentLayer {
    type Service = DevelopmentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DevelopmentService {
            host: self.host.clone(),
            inner,
        }
    }
}

/// Service produced by [`DevelopmentLayer`].
#[derive(Clone)]
pub struct DevelopmentService<S> {
    host: Arc<dyn RoutingHost>,
    inner: S,
}

impl<S> Service<Request<Body>> for DevelopmentService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let host = self.host.clone();
        // Keep the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match host.dispatch(request).await {
                Ok(Dispatch::Handled(response)) => Ok(response),
                Ok(Dispatch::Fallthrough { mut request, locals }) => {
                    request.extensions_mut().insert(locals);
                    inner.call(request).await
                }
                Err(e) => {
                    tracing::error!(error = %e, "Route handler failed");
                    Ok(handler_error_response(&e, true))
                }
            }
        })
    }
}

/// The host-owned pipeline used by the binary in development mode: renders
/// every request it receives with the locals found on the request.
pub fn host_pipeline(catch_all: CatchAll) -> Router {
    Router::new().fallback(render_with_locals).with_state(catch_all)
}

async fn render_with_locals(State(catch_all): State<CatchAll>, mut request: Request<Body>) -> Response<Body> {
    let locals = request.take_locals();
    match catch_all.respond(request, locals).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Render failed");
            handler_error_response(&e, true)
        }
    }
}
