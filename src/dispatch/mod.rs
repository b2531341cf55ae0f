//! Route dispatcher.
//!
//! # Data Flow
//! ```text
//! request
//!     → user routes, in registration order
//!         Flow::Respond  → Dispatch::Handled (terminal)
//!         Flow::Next     → next route (locals possibly updated)
//!     → Dispatch::Fallthrough { request, locals }
//!     → catch-all (production: render + bridge; development: host chain)
//! ```
//!
//! # Design Decisions
//! - The result is an explicit, request-scoped value; nothing is stashed in globals
//! - Handler errors are returned as-is so the host decides how to surface them
//! - The route table is swapped atomically, so in-flight requests keep the table they started with

pub mod catch_all;

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{Request, Response};

use crate::locals::{Locals, LocalsExt};
use crate::routing::{Flow, HandlerError, Routes};

pub use catch_all::CatchAll;

/// Outcome of running the user routes for one request.
pub enum Dispatch {
    /// A route produced the response.
    Handled(Response<Body>),
    /// Every route delegated (or none matched); the catch-all takes over.
    Fallthrough { request: Request<Body>, locals: Locals },
}

impl Dispatch {
    pub fn is_handled(&self) -> bool {
        matches!(self, Dispatch::Handled(_))
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatch::Handled(response) => f.debug_tuple("Handled").field(&response.status()).finish(),
            Dispatch::Fallthrough { request, locals } => f
                .debug_struct("Fallthrough")
                .field("path", &request.uri().path())
                .field("locals", locals)
                .finish(),
        }
    }
}

/// Runs requests through the installed user routes.
#[derive(Debug)]
pub struct Dispatcher {
    routes: ArcSwap<Routes>,
}

impl Dispatcher {
    /// A dispatcher with no user routes.
    pub fn new() -> Self {
        Self::with_routes(Routes::new())
    }

    pub fn with_routes(routes: Routes) -> Self {
        Self {
            routes: ArcSwap::from_pointee(routes),
        }
    }

    /// Replace the route table. Requests already dispatching keep the old one.
    pub fn install(&self, routes: Routes) {
        self.routes.store(Arc::new(routes));
    }

    /// Number of installed routes.
    pub fn route_count(&self) -> usize {
        self.routes.load().len()
    }

    /// Evaluate the user routes left to right.
    pub async fn dispatch(&self, mut request: Request<Body>) -> Result<Dispatch, HandlerError> {
        let routes = self.routes.load_full();

        for route in routes.iter() {
            if !route.matches(&request) {
                continue;
            }

            tracing::trace!(route = %route.name(), path = %request.uri().path(), "Route matched");

            match route.handler().call(request).await? {
                Flow::Respond(response) => {
                    tracing::debug!(route = %route.name(), status = %response.status(), "Route handled request");
                    return Ok(Dispatch::Handled(response));
                }
                Flow::Next(next) => request = next,
            }
        }

        let locals = request.take_locals();
        Ok(Dispatch::Fallthrough { request, locals })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
