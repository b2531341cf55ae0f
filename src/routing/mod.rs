//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup / dev-server start):
//!     entrypoint.register(&mut Routes)
//!     → router.rs (append route, keep order)
//!     → matcher.rs (compile method + path pattern)
//!
//! Request time:
//!     dispatch walks Routes in order
//!     → first matching handler returns Flow::Respond or Flow::Next
//! ```
//!
//! # Design Decisions
//! - Routes compiled at registration, immutable at runtime
//! - No regex in hot path (exact and prefix matching only)
//! - Deterministic: registration order is evaluation order

pub mod handler;
pub mod matcher;
pub mod router;

pub use handler::{Flow, HandlerError, RouteHandler};
pub use router::{Route, Routes};
