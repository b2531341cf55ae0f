//! Catch-all renderer: the last stop for every request no route resolved.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::bridge::{self, channel_sink};
use crate::locals::Locals;
use crate::observability::metrics;
use crate::render::SsrEngine;
use crate::routing::HandlerError;

/// Renders with the accumulated locals and streams the result through the bridge.
#[derive(Clone)]
pub struct CatchAll {
    engine: Arc<dyn SsrEngine>,
    body_buffer: usize,
}

impl CatchAll {
    /// `body_buffer` is the number of chunks queued ahead of a slow client.
    pub fn new(engine: Arc<dyn SsrEngine>, body_buffer: usize) -> Self {
        Self { engine, body_buffer }
    }

    pub fn engine(&self) -> &Arc<dyn SsrEngine> {
        &self.engine
    }

    /// Render `request` and return a response whose body streams as the
    /// renderer produces it.
    pub async fn respond(&self, request: Request<Body>, locals: Locals) -> Result<Response<Body>, HandlerError> {
        let start = Instant::now();
        let path = request.uri().path().to_string();

        let rendered = self.engine.render(request, locals).await?;
        metrics::record_render(rendered.status.as_u16(), start);

        let (mut sink, pending) = channel_sink(self.body_buffer);
        let engine = self.engine.clone();

        // The bridge runs to completion or until the client goes away; there is
        // no cancellation of an in-flight render.
        tokio::spawn(async move {
            match bridge::deliver(&mut sink, engine.as_ref(), rendered).await {
                Ok(delivery) => {
                    metrics::record_delivery(delivery.chunks, delivery.bytes);
                    tracing::debug!(
                        path = %path,
                        chunks = delivery.chunks,
                        bytes = delivery.bytes,
                        "Response delivered"
                    );
                }
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Response delivery aborted");
                }
            }
        });

        Ok(pending.into_response().await?)
    }
}

impl std::fmt::Debug for CatchAll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatchAll")
            .field("body_buffer", &self.body_buffer)
            .finish_non_exhaustive()
    }
}
