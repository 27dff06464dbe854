//! # Observability Setup
//!
//! Structured logging initialization for the embedding process. Selection
//! emits `tracing` events and `metrics` facade counters throughout the
//! crate; this module wires up the subscriber side. Metrics exporter
//! installation (Prometheus etc.) is left to the embedding gateway.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::LoggingConfig;
use crate::core::error::{GatewayError, GatewayResult};

/// Initialize the global tracing subscriber from logging configuration
///
/// The configured level is the default filter; a `RUST_LOG` environment
/// variable takes precedence. `format: json` switches to machine-readable
/// output for production log pipelines.
///
/// Fails if a global subscriber is already installed, so call it once at
/// process startup.
pub fn init_logging(config: &LoggingConfig) -> GatewayResult<()> {
    let level: LevelFilter = config
        .level
        .parse()
        .map_err(|e| GatewayError::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    result.map_err(|e| GatewayError::config(format!("Failed to initialize logging: {}", e)))
}
