//! # Configuration Module
//!
//! This module handles the configuration surface consumed by the selection
//! core. It provides the configuration structures, YAML/JSON loading with
//! serde, environment variable overrides, and comprehensive validation with
//! detailed error messages.
//!
//! ## Key Features
//! - YAML/JSON configuration parsing with serde
//! - Environment variable override support (`GATEWAY_*` convention)
//! - Collect-all validation: every problem is reported at once, not just the first
//! - Validation failures are fatal at startup - the process must not serve
//!   traffic with an inconsistent weight table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;
use url::Url;

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::Endpoint;

/// Main configuration structure for the selection core
///
/// This mirrors the JSON configuration the gateway is deployed with: an
/// ordered list of logical service names participating in weighted routing,
/// a weight per service name, the static per-route downstream address lists,
/// and optional dynamically discovered base URLs keyed by service name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Ordered list of logical service names eligible for weighting
    #[serde(default)]
    pub generator_services: Vec<String>,

    /// Logical service name -> non-negative traffic weight
    #[serde(default)]
    pub replica_weights: HashMap<String, f64>,

    /// Route definitions with their static downstream address lists
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Dynamically discovered base URL per service name
    ///
    /// When present for a service, the URL's host and port take precedence
    /// over the statically configured downstream address. Typically injected
    /// by the orchestrator at deploy time.
    #[serde(default)]
    pub service_urls: HashMap<String, String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One route and its statically configured downstream candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route identifier used by `lease(route)`
    pub id: String,

    /// Ordered downstream host/port pairs for this route
    #[serde(default)]
    pub downstream: Vec<DownstreamAddress>,
}

/// A statically configured downstream host/port pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamAddress {
    pub host: String,
    pub port: u16,
}

impl DownstreamAddress {
    /// Convert to a runtime endpoint
    pub fn to_endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set (trace/debug/info/warn/error)
    pub level: String,

    /// Log output format: "pretty" for development, "json" for production
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: GatewayConfig = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::config(format!("Failed to parse config: {}", e)))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub async fn load_from_json<P: AsRef<Path>>(path: P) -> GatewayResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::config(format!("Failed to read config file: {}", e)))?;

        let mut config: GatewayConfig = serde_json::from_str(&content)
            .map_err(|e| GatewayError::config(format!("Failed to parse JSON config: {}", e)))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Environment variables follow the pattern `GATEWAY_<SECTION>_<FIELD>`:
    /// - `GATEWAY_LOG_LEVEL`, `GATEWAY_LOG_FORMAT`
    /// - `GATEWAY_SERVICE_URL_<NAME>` overrides the discovered base URL for a
    ///   service; `<NAME>` is the service name uppercased with `-` and `.`
    ///   mapped to `_` (e.g. `GATEWAY_SERVICE_URL_GENERATOR_1`)
    ///
    /// This is how orchestrator-resolved addresses reach the weight tables in
    /// containerized deployments.
    pub fn apply_env_overrides(&mut self) {
        use std::env;

        if let Ok(level) = env::var("GATEWAY_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("GATEWAY_LOG_FORMAT") {
            self.logging.format = format;
        }

        for name in &self.generator_services {
            let var = format!("GATEWAY_SERVICE_URL_{}", env_segment(name));
            if let Ok(url) = env::var(&var) {
                self.service_urls.insert(name.clone(), url);
            }
        }
    }

    /// Comprehensive configuration validation with detailed error messages
    ///
    /// All problems are collected before reporting so a misconfigured
    /// deployment surfaces every issue in one startup failure. Negative
    /// weights are accepted here and clamped to zero at selection time;
    /// non-finite weights (NaN, infinity) are malformed and fatal.
    pub fn validate(&self) -> GatewayResult<()> {
        let mut errors = Vec::new();

        for (name, weight) in &self.replica_weights {
            if name.is_empty() {
                errors.push("replica_weights contains an empty service name".to_string());
            }
            if !weight.is_finite() {
                errors.push(format!(
                    "replica_weights['{}'] is not a finite number: {}",
                    name, weight
                ));
            } else if *weight < 0.0 {
                warn!(
                    service = %name,
                    weight = weight,
                    "Negative replica weight will be clamped to zero during selection"
                );
            }
        }

        for name in &self.generator_services {
            if name.is_empty() {
                errors.push("generator_services contains an empty service name".to_string());
            }
        }

        let mut seen_routes = std::collections::HashSet::new();
        for (index, route) in self.routes.iter().enumerate() {
            if route.id.is_empty() {
                errors.push(format!("Route {} has an empty id", index));
            } else if !seen_routes.insert(route.id.as_str()) {
                errors.push(format!("Duplicate route id '{}'", route.id));
            }

            for (i, addr) in route.downstream.iter().enumerate() {
                if addr.host.is_empty() {
                    errors.push(format!(
                        "Route '{}' downstream {} has an empty host",
                        route.id, i
                    ));
                }
            }
        }

        for (name, url) in &self.service_urls {
            match Url::parse(url) {
                Ok(parsed) if parsed.host_str().is_some() => {}
                Ok(_) => errors.push(format!(
                    "service_urls['{}'] has no host component: {}",
                    name, url
                )),
                Err(e) => errors.push(format!(
                    "service_urls['{}'] is not a valid URL ({}): {}",
                    name, e, url
                )),
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::config(errors.join("; ")))
        }
    }
}

/// Map a service name onto the environment-variable segment convention
fn env_segment(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
