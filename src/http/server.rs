//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the mode's routing host in an Axum router
//! - Wire up middleware (request ID, tracing, timeout)
//! - Surface handler errors as 500 responses
//! - Serve on a bound listener with graceful shutdown

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response, StatusCode},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::BridgeConfig;
use crate::dispatch::Dispatch;
use crate::host::{DevelopmentHost, RoutingHost};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::{handler_error_response, text_response};
use crate::observability::metrics;

/// Application state injected into the catch-all handler.
#[derive(Clone)]
struct AppState {
    host: Arc<dyn RoutingHost>,
    expose_errors: bool,
}

/// HTTP server for either mode.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// A server whose every request goes through `host`.
    pub fn production(config: &BridgeConfig, host: Arc<dyn RoutingHost>) -> Self {
        let state = AppState {
            host,
            expose_errors: false,
        };
        let router = Router::new().fallback(host_handler).with_state(state);
        Self {
            router: Self::with_middleware(config, router),
        }
    }

    /// A server running the host-owned `pipeline` with `host` spliced in front.
    pub fn development(config: &BridgeConfig, host: &Arc<DevelopmentHost>, pipeline: Router) -> Self {
        Self {
            router: Self::with_middleware(config, pipeline.layer(host.layer())),
        }
    }

    /// Add the shared middleware stack.
    #[allow(deprecated)]
    fn with_middleware(config: &BridgeConfig, router: Router) -> Router {
        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all Axum handler: every request goes to the routing host.
async fn host_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    match state.host.dispatch(request).await {
        Ok(Dispatch::Handled(response)) => {
            metrics::record_request(&method, response.status().as_u16(), "handled", start_time);
            response
        }
        Ok(Dispatch::Fallthrough { .. }) => {
            tracing::warn!(request_id = %request_id, path = %path, "No catch-all resolved request");
            metrics::record_request(&method, 404, "unhandled", start_time);
            text_response(StatusCode::NOT_FOUND, "Not Found")
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, path = %path, error = %e, "Request failed");
            metrics::record_request(&method, 500, "error", start_time);
            handler_error_response(&e, state.expose_errors)
        }
    }
}
