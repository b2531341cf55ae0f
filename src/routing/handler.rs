//! Route handler contract.

use std::future::Future;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use thiserror::Error;

use crate::bridge::SinkError;
use crate::render::{BoxError, RenderError};

/// What a handler decided to do with a request.
pub enum Flow {
    /// The request is fully resolved.
    Respond(Response<Body>),
    /// Hand the (possibly modified) request to the next handler.
    Next(Request<Body>),
}

impl Flow {
    pub fn respond(response: impl IntoResponse) -> Self {
        Flow::Respond(response.into_response())
    }

    pub fn next(request: Request<Body>) -> Self {
        Flow::Next(request)
    }
}

/// Errors escaping a handler. The dispatcher never swallows these.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("response bridge failed: {0}")]
    Bridge(#[from] SinkError),

    #[error("{0}")]
    Failed(#[source] BoxError),
}

impl HandlerError {
    /// Wrap an arbitrary error raised by user code.
    pub fn failed(err: impl Into<BoxError>) -> Self {
        HandlerError::Failed(err.into())
    }
}

/// A request handler in the dispatch chain.
#[async_trait]
pub trait RouteHandler: Send + Sync + 'static {
    async fn call(&self, request: Request<Body>) -> Result<Flow, HandlerError>;
}

#[async_trait]
impl<F, Fut> RouteHandler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Flow, HandlerError>> + Send + 'static,
{
    async fn call(&self, request: Request<Body>) -> Result<Flow, HandlerError> {
        (self)(request).await
    }
}
