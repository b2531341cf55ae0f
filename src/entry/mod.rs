//! Route-registration entrypoints.
//!
//! # Data Flow
//! ```text
//! configured entry path
//!     → manifest.rs (read + parse TOML, validate every route)
//!     → ManifestEntry (a Registrar)
//!     → host.install_routes(&entry) → Registrar::register(&mut Routes)
//!
//! Development only:
//!     watcher.rs detects change → reload manifest → reinstall routes
//! ```
//!
//! # Design Decisions
//! - A file that does not define a `routes` array of tables is rejected as a
//!   whole, naming the file; no partial route table is ever installed
//! - Closures implement [`Registrar`] so routes can also be registered in code

pub mod manifest;
pub mod watcher;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::routing::{HandlerError, Routes};

pub use manifest::{load_entrypoint, ManifestEntry};
pub use watcher::EntryWatcher;

/// Startup-time failures of a registration entrypoint.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("failed to read route entrypoint {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("route entrypoint {} should define a `routes` array of tables: {reason}", path.display())]
    InvalidEntrypoint { path: PathBuf, reason: String },

    #[error("route entrypoint {}: route #{index}: {reason}", path.display())]
    InvalidRoute {
        path: PathBuf,
        index: usize,
        reason: String,
    },

    #[error("route registration failed: {0}")]
    Register(#[source] HandlerError),

    #[error("routes are already installed")]
    AlreadyInstalled,
}

/// Something that registers user routes on a dispatcher handle.
#[async_trait]
pub trait Registrar: Send + Sync {
    async fn register(&self, routes: &mut Routes) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F> Registrar for F
where
    F: Fn(&mut Routes) + Send + Sync,
{
    async fn register(&self, routes: &mut Routes) -> Result<(), HandlerError> {
        (self)(routes);
        Ok(())
    }
}
