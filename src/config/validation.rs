//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, buffer sizes > 0)
//! - Validate the asset prefix shape and metrics address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::BridgeConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }

    if config.server.body_buffer_chunks == 0 {
        errors.push(ValidationError::new("server.body_buffer_chunks", "must be greater than 0"));
    }

    if config.assets.enabled {
        let prefix = &config.assets.prefix;
        if !prefix.starts_with('/') || !prefix.ends_with('/') || prefix == "/" {
            errors.push(ValidationError::new(
                "assets.prefix",
                format!("`{prefix}` must start and end with `/` and name a directory"),
            ));
        }
        if prefix.split('/').any(|segment| segment == "..") {
            errors.push(ValidationError::new("assets.prefix", "must not contain `..`"));
        }
    }

    if let Some(entry) = &config.entry {
        if entry.as_os_str().is_empty() {
            errors.push(ValidationError::new("entry", "must not be empty"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
