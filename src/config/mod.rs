//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ssr-bridge.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides (mode, host, port, entry)
//!     → BridgeConfig (validated, immutable)
//!
//! Listening address:
//!     config.server → HOST / PORT env → 0.0.0.0:80
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{bind_target, bind_target_from_env, load_config, ConfigError};
pub use schema::{AssetsConfig, BridgeConfig, DevConfig, Mode, ObservabilityConfig, RenderConfig, ServerConfig};
