//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID assigned and echoed)
//!     → routing host for the active mode
//!     → response.rs (error responses for failures that escaped the chain)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
