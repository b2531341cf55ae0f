//! Built-in preview renderer.
//!
//! Streams a small HTML document in three chunks (shell, content, closing tags)
//! with the request path and the request locals embedded. A `cookies` array in
//! the locals is turned into `Set-Cookie` headers through the cookie capability.

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request, StatusCode};
use serde_json::Value;

use super::{RenderError, SsrEngine, SsrResponse};
use crate::locals::Locals;

/// Cookies requested during rendering, waiting to be emitted by the bridge.
#[derive(Debug, Clone, Default)]
struct PendingCookies(Vec<HeaderValue>);

/// Renderer used by the `ssr-bridge` binary.
#[derive(Debug, Clone)]
pub struct PreviewEngine {
    title: String,
}

impl PreviewEngine {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    /// The exact HTML the engine produces for `path` and `locals`.
    pub fn page(&self, path: &str, locals: &Locals) -> Vec<Bytes> {
        let shell = format!(
            "<!doctype html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
            escape_html(&self.title)
        );
        let locals_json = serde_json::to_string(locals.as_map()).unwrap_or_else(|_| "{}".into());
        let content = format!(
            "<main data-path=\"{}\"><h1>{}</h1><script type=\"application/json\" id=\"locals\">{}</script></main>",
            escape_html(path),
            escape_html(path),
            locals_json.replace("</", "<\\/")
        );
        vec![
            Bytes::from(shell),
            Bytes::from(content),
            Bytes::from_static(b"</body></html>"),
        ]
    }
}

impl Default for PreviewEngine {
    fn default() -> Self {
        Self::new("ssr-bridge")
    }
}

#[async_trait]
impl SsrEngine for PreviewEngine {
    async fn render(&self, request: Request<Body>, locals: Locals) -> Result<SsrResponse, RenderError> {
        let path = request.uri().path().to_string();
        let cookies = cookies_from_locals(&locals);

        tracing::trace!(path = %path, locals = locals.len(), cookies = cookies.len(), "Rendering preview page");

        let mut response = SsrResponse::new(StatusCode::OK)
            .with_header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )
            .with_chunks(self.page(&path, &locals));
        response.extensions.insert(PendingCookies(cookies));
        Ok(response)
    }

    fn set_cookie_headers(&self, response: &SsrResponse) -> Option<Vec<HeaderValue>> {
        response
            .extensions
            .get::<PendingCookies>()
            .map(|pending| pending.0.clone())
    }
}

fn cookies_from_locals(locals: &Locals) -> Vec<HeaderValue> {
    match locals.get("cookies") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|raw| match HeaderValue::from_str(raw) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(cookie = %raw, "Skipping cookie with invalid header characters");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
