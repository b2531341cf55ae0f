//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http server   → request counts and latency (metrics.rs), request spans
//! catch-all     → render latency (metrics.rs)
//! bridge        → streamed chunks and bytes (metrics.rs)
//! every module  → structured events, filtered by logging.rs
//! ```
//!
//! Nothing is exported until `init_metrics` installs a recorder; logging is
//! stdout only.

pub mod logging;
pub mod metrics;
