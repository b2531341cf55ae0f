//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{BridgeConfig, FALLBACK_HOST, FALLBACK_PORT};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("invalid {name} value `{value}`")]
    Env { name: &'static str, value: String },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BridgeConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the listening host and port.
///
/// Config wins, then the `HOST`/`PORT` variables from `env`, then the
/// fallbacks (`0.0.0.0`, port 80).
pub fn bind_target<F>(config: &BridgeConfig, env: F) -> Result<(String, u16), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = match &config.server.host {
        Some(host) => host.clone(),
        None => env("HOST")
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| FALLBACK_HOST.to_string()),
    };

    let port = match config.server.port {
        Some(port) => port,
        None => match env("PORT").filter(|p| !p.is_empty()) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { name: "PORT", value: raw })?,
            None => FALLBACK_PORT,
        },
    };

    Ok((host, port))
}

/// [`bind_target`] against the process environment.
pub fn bind_target_from_env(config: &BridgeConfig) -> Result<(String, u16), ConfigError> {
    bind_target(config, |name| std::env::var(name).ok())
}
