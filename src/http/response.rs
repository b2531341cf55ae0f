//! Error responses surfaced to clients.
//!
//! # Design Decisions
//! - Handler and render failures become 500s; the dispatcher itself never hides them
//! - Development shows the error text, production only a generic message

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::routing::HandlerError;

/// A 500 response for an error that escaped the routing chain.
pub fn handler_error_response(error: &HandlerError, expose: bool) -> Response<Body> {
    let body = if expose {
        format!("Internal Server Error\n\n{error}")
    } else {
        "Internal Server Error".to_string()
    };
    text_response(StatusCode::INTERNAL_SERVER_ERROR, body)
}

/// Plain-text response helper.
pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response<Body> {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
