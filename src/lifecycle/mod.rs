//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     production:  load entry → install routes → bind → serve
//!     development: bind → serve → load entry → install routes → watch entry
//!
//! Shutdown (shutdown.rs):
//!     trigger → stop accepting → drain in-flight requests → task ends
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
pub use startup::{start, start_development, start_production, RunningServer, StartupError};
