//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Echo the ID back on the response
//! - Expose the ID to handlers and log lines
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)

use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};

/// Header carrying the request ID.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer assigning an `x-request-id` to every request that lacks one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuid)
}

/// Layer copying the request's `x-request-id` onto its response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID.clone())
}

/// Access to the request ID assigned by [`set_request_id_layer`].
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .or_else(|| self.headers().get(&X_REQUEST_ID).and_then(|v| v.to_str().ok()))
            .unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_request_id_from_header_or_unknown() {
        let req = Request::builder()
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(req.request_id(), "abc-123");

        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(req.request_id(), "unknown");
    }
}
