//! Server-side-rendering bridge for a standalone HTTP host.
//!
//! Connects a rendering engine to an HTTP server in one of two modes:
//! production, where the bridge owns the listener, and development, where it
//! is spliced in front of a host-owned request pipeline.

pub mod assets;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod entry;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod locals;
pub mod observability;
pub mod render;
pub mod routing;

pub use bridge::{deliver, BridgeError, ResponseSink};
pub use config::{BridgeConfig, Mode};
pub use dispatch::{CatchAll, Dispatch, Dispatcher};
pub use entry::{EntryError, Registrar};
pub use host::{DevelopmentHost, ProductionHost, RoutingHost};
pub use http::HttpServer;
pub use lifecycle::{start, RunningServer, Shutdown, StartupError};
pub use locals::{Locals, LocalsExt};
pub use render::{PreviewEngine, SsrEngine, SsrResponse};
pub use routing::{Flow, HandlerError, Routes};
