//! Server-side rendering capability.
//!
//! # Data Flow
//! ```text
//! catch-all (request + accumulated locals)
//!     → SsrEngine::render
//!     → SsrResponse { status, headers, lazy body }
//!     → bridge::deliver (consumes the response exactly once)
//! ```
//!
//! The renderer is opaque to the rest of the crate. Anything implementing
//! [`SsrEngine`] can be plugged into either host mode.

pub mod preview;

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header::HeaderName, Extensions, HeaderMap, HeaderValue, Request, StatusCode};
use futures_util::stream::{self, Stream, StreamExt};
use thiserror::Error;

use crate::locals::Locals;

pub use preview::PreviewEngine;

/// Boxed error used for body faults and handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Lazily produced sequence of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A rendered response: status, header multimap and an optional streamed body.
pub struct SsrResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<BodyStream>,
    /// Renderer-private data travelling with the response (e.g. pending cookies).
    pub extensions: Extensions,
}

impl SsrResponse {
    /// A bodiless response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
            extensions: Extensions::new(),
        }
    }

    /// A single-chunk text response.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )
            .with_chunks([Bytes::from(body.into())])
    }

    /// Append a header value, keeping any existing values for the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: BodyStream) -> Self {
        self.body = Some(body);
        self
    }

    /// Use a fixed sequence of chunks as the body.
    pub fn with_chunks<I>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = Bytes>,
        I::IntoIter: Send + 'static,
    {
        self.with_body(stream::iter(chunks).map(Ok::<Bytes, BoxError>).boxed())
    }
}

impl fmt::Debug for SsrResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsrResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

/// Rendering failures surfaced to the host.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render failed for {path}: {source}")]
    Failed {
        path: String,
        #[source]
        source: BoxError,
    },
}

/// The SSR engine: renders a request with its locals into a response.
#[async_trait]
pub trait SsrEngine: Send + Sync + 'static {
    async fn render(&self, request: Request<Body>, locals: Locals) -> Result<SsrResponse, RenderError>;

    /// Raw `Set-Cookie` values the engine wants emitted for `response`.
    ///
    /// `None` means the engine has no cookie support and the bridge skips
    /// cookie post-processing entirely.
    fn set_cookie_headers(&self, _response: &SsrResponse) -> Option<Vec<HeaderValue>> {
        None
    }
}
