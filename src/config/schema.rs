//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default port when neither config nor `PORT` provide one.
pub const FALLBACK_PORT: u16 = 80;

/// Default host when neither config nor `HOST` provide one.
pub const FALLBACK_HOST: &str = "0.0.0.0";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Runtime mode, fixed for the lifetime of the process.
    pub mode: Mode,

    /// Route manifest loaded as the route-registration entrypoint.
    pub entry: Option<PathBuf>,

    /// Listener configuration.
    pub server: ServerConfig,

    /// Static files (production only).
    pub assets: AssetsConfig,

    /// Development-mode settings.
    pub dev: DevConfig,

    /// Built-in renderer settings.
    pub render: RenderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Runtime mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Spliced in front of a host-owned request pipeline.
    #[serde(alias = "dev")]
    Development,
    /// Owns the listener and the full request lifecycle.
    #[default]
    #[serde(alias = "prod")]
    Production,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Mode::Development),
            "prod" | "production" => Ok(Mode::Production),
            other => Err(format!("unknown mode `{other}` (expected dev or prod)")),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Development => f.write_str("development"),
            Mode::Production => f.write_str("production"),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host; falls back to `HOST`, then all interfaces.
    pub host: Option<String>,

    /// Bind port; falls back to `PORT`, then 80.
    pub port: Option<u16>,

    /// Time allowed until the response head is ready, in seconds.
    pub request_timeout_secs: u64,

    /// Body chunks queued ahead of a slow client before the renderer waits.
    pub body_buffer_chunks: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            request_timeout_secs: 30,
            body_buffer_chunks: 16,
        }
    }
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Serve static files at all.
    pub enabled: bool,

    /// Directory holding the built client files.
    pub client_root: PathBuf,

    /// URL prefix of fingerprinted assets (served with an immutable cache policy).
    pub prefix: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_root: PathBuf::from("dist/client"),
            prefix: "/assets/".to_string(),
        }
    }
}

/// Development-mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevConfig {
    /// Reinstall routes when the entry manifest changes.
    pub watch_entry: bool,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self { watch_entry: true }
    }
}

/// Built-in renderer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Document title of rendered pages.
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "ssr-bridge".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or full filter directives.
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
