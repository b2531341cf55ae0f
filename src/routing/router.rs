//! Ordered route table.
//!
//! # Responsibilities
//! - Collect user routes in registration order
//! - Pair each compiled matcher with its handler
//!
//! # Design Decisions
//! - Registration order is evaluation order; there is no priority field
//! - Immutable once handed to a dispatcher (swapped whole, never edited in place)

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};

use super::handler::RouteHandler;
use super::matcher::{compile, Matcher};

/// A registered route.
pub struct Route {
    name: String,
    matcher: Box<dyn Matcher>,
    handler: Arc<dyn RouteHandler>,
}

impl Route {
    /// Display name, e.g. `GET /ping` or `* /mixed`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, req: &Request<Body>) -> bool {
        self.matcher.matches(req)
    }

    pub fn handler(&self) -> &dyn RouteHandler {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .finish()
    }
}

/// The handle passed to route registration entrypoints.
#[derive(Debug, Default)]
pub struct Routes {
    routes: Vec<Route>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<H: RouteHandler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Some(Method::GET), path, handler)
    }

    pub fn post<H: RouteHandler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Some(Method::POST), path, handler)
    }

    pub fn put<H: RouteHandler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Some(Method::PUT), path, handler)
    }

    pub fn patch<H: RouteHandler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Some(Method::PATCH), path, handler)
    }

    pub fn delete<H: RouteHandler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Some(Method::DELETE), path, handler)
    }

    /// Register a handler for every method.
    pub fn all<H: RouteHandler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(None, path, handler)
    }

    /// Register a handler; `None` matches any method.
    pub fn route<H: RouteHandler>(&mut self, method: Option<Method>, path: &str, handler: H) -> &mut Self {
        let name = format!(
            "{} {}",
            method.as_ref().map(Method::as_str).unwrap_or("*"),
            path
        );
        tracing::debug!(route = %name, position = self.routes.len(), "Route registered");

        self.routes.push(Route {
            name,
            matcher: compile(method, path),
            handler: Arc::new(handler),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Flow, HandlerError};

    async fn pass(req: Request<Body>) -> Result<Flow, HandlerError> {
        Ok(Flow::Next(req))
    }

    #[test]
    fn test_routes_keep_registration_order() {
        let mut routes = Routes::new();
        routes.get("/a", pass).post("/b", pass).all("/c/*", pass);

        let names: Vec<_> = routes.iter().map(Route::name).collect();
        assert_eq!(names, vec!["GET /a", "POST /b", "* /c/*"]);
        assert_eq!(routes.len(), 3);
    }
}
