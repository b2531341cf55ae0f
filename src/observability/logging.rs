//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the log filter from `RUST_LOG`, then config
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` always wins over the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Default directives when neither `RUST_LOG` nor config says otherwise.
pub const DEFAULT_FILTER: &str = "ssr_bridge=debug,tower_http=debug";

/// Filter directives for a configured level (`info`, `debug`, ... or full directives).
pub fn filter_directives(config: &ObservabilityConfig) -> String {
    let level = config.log_level.trim();
    if level.is_empty() {
        DEFAULT_FILTER.to_string()
    } else if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("ssr_bridge={level},tower_http={level}")
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        let mut config = ObservabilityConfig::default();
        config.log_level = "warn".into();
        assert_eq!(filter_directives(&config), "ssr_bridge=warn,tower_http=warn");

        config.log_level = "ssr_bridge=trace,hyper=info".into();
        assert_eq!(filter_directives(&config), "ssr_bridge=trace,hyper=info");

        config.log_level = String::new();
        assert_eq!(filter_directives(&config), DEFAULT_FILTER);
    }
}
