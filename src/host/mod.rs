//! Mode reconciler.
//!
//! Both modes give the same ordering guarantee (assets → user routes →
//! catch-all) but own different parts of the request lifecycle.
//!
//! ```text
//! Production:  listener → ProductionHost
//!                  assets prefix? → StaticFiles (immutable cache)  [terminal]
//!                  user routes    → Dispatch::Handled               [terminal]
//!                  client file?   → StaticFiles                    [terminal]
//!                  catch-all      → render + bridge                 [terminal]
//!
//! Development: host listener → DevelopmentLayer → DevelopmentHost
//!                  user routes    → Dispatch::Handled               [terminal]
//!                  fallthrough    → locals inserted as extension
//!                                 → host-owned inner service (its own SSR step)
//! ```
//!
//! # Design Decisions
//! - One `RoutingHost` implementation per mode, chosen once at startup
//! - Locals travel as an explicit return value, then as a request extension

pub mod development;
pub mod production;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;

use crate::dispatch::Dispatch;
use crate::entry::{EntryError, Registrar};
use crate::routing::HandlerError;

pub use development::{host_pipeline, DevelopmentHost, DevelopmentLayer, DevelopmentService};
pub use production::ProductionHost;

/// How user routes are installed and requests dispatched for one mode.
#[async_trait]
pub trait RoutingHost: Send + Sync + 'static {
    /// Run `registrar` against a fresh route table and install the result.
    /// Returns the number of installed routes.
    async fn install_routes(&self, registrar: &dyn Registrar) -> Result<usize, EntryError>;

    /// Route one request.
    async fn dispatch(&self, request: Request<Body>) -> Result<Dispatch, HandlerError>;
}
