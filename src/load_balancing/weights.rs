//! # Weight Resolution Module
//!
//! This module builds the two immutable tables that drive weighted selection:
//!
//! - the **weight table**: logical service name -> configured traffic weight
//! - the **address index**: normalized `host:port` -> logical service name
//!
//! Both are constructed exactly once at startup by cross-referencing the
//! configured service names with their resolved addresses (dynamically
//! discovered URL first, static downstream entry second, documented default
//! last). After construction the tables are read-only and shared freely
//! across all concurrent selections - no locking on the hot path.

use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

use crate::core::config::GatewayConfig;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::Endpoint;

/// Weight used for any candidate whose address is not mapped to a weighted
/// service
///
/// Every candidate participates in selection with positive probability mass
/// unless its service is explicitly configured to weight zero.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Documented fallback address for a service with neither a discovered URL
/// nor a static downstream slot
const FALLBACK_HOST: &str = "localhost";
const FALLBACK_PORT: u16 = 0;

/// Normalize an address string for index lookups
///
/// Hostnames are case-insensitive; selection must resolve the same weight
/// no matter how discovery spelled the host.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Immutable weight-resolution tables built once from configuration
///
/// Holds the service weight table, the address-to-service index, and the
/// effective per-route candidate lists after discovered-address overrides
/// have been applied. Constructed before any request is served; immutable
/// for the remainder of the process lifetime.
#[derive(Debug, Clone)]
pub struct WeightSet {
    /// Logical service name -> configured weight
    weights: HashMap<String, f64>,
    /// Normalized address -> logical service name (weighted services only)
    by_address: HashMap<String, String>,
    /// Route id -> downstream candidates with discovery overrides applied
    effective_routes: HashMap<String, Vec<Endpoint>>,
}

impl WeightSet {
    /// Build the weight tables from configuration
    ///
    /// A pure construction: it reads the config snapshot and returns the
    /// immutable tables, with no global mutable state. For each configured
    /// service name (in order) the advertised address is resolved by
    /// preference:
    ///
    /// 1. the dynamically discovered base URL (`service_urls`), which also
    ///    overrides the corresponding positional slot of the first route's
    ///    downstream list
    /// 2. the first route's statically configured downstream entry at the
    ///    same position
    /// 3. the fallback `localhost:0`
    ///
    /// The address is indexed only when the service has a weight entry.
    /// Missing optional configuration never fails construction; the mapping
    /// is simply omitted and later resolution falls back to
    /// [`DEFAULT_WEIGHT`].
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let mut effective_routes: HashMap<String, Vec<Endpoint>> = config
            .routes
            .iter()
            .map(|route| {
                (
                    route.id.clone(),
                    route.downstream.iter().map(|d| d.to_endpoint()).collect(),
                )
            })
            .collect();

        let first_route_id = config.routes.first().map(|route| route.id.clone());

        let mut by_address = HashMap::new();

        for (position, name) in config.generator_services.iter().enumerate() {
            let discovered = match config.service_urls.get(name) {
                Some(raw) => Some(parse_service_url(name, raw)?),
                None => None,
            };

            let resolved = if let Some(endpoint) = discovered {
                // Discovery output wins over static config: patch the
                // positional slot of the first route's downstream list.
                if let Some(route_id) = &first_route_id {
                    let candidates = effective_routes
                        .get_mut(route_id)
                        .ok_or_else(|| GatewayError::config("first route missing"))?;
                    if position < candidates.len() {
                        candidates[position] = endpoint.clone();
                    } else {
                        candidates.push(endpoint.clone());
                    }
                    debug!(
                        service = %name,
                        address = %endpoint.address(),
                        route = %route_id,
                        position = position,
                        "Applied discovered address override to route"
                    );
                }
                endpoint
            } else {
                config
                    .routes
                    .first()
                    .and_then(|route| route.downstream.get(position))
                    .map(|d| d.to_endpoint())
                    .unwrap_or_else(|| Endpoint::new(FALLBACK_HOST, FALLBACK_PORT))
            };

            if config.replica_weights.contains_key(name) {
                by_address.insert(normalize_address(&resolved.address()), name.clone());
            } else {
                debug!(
                    service = %name,
                    address = %resolved.address(),
                    "Service has no replica weight entry; candidates will use the default weight"
                );
            }
        }

        info!(
            weighted_services = config.replica_weights.len(),
            indexed_addresses = by_address.len(),
            routes = effective_routes.len(),
            "Built weight tables"
        );

        Ok(Self {
            weights: config.replica_weights.clone(),
            by_address,
            effective_routes,
        })
    }

    /// Resolve the traffic weight for a candidate address
    ///
    /// Total over any address string: an address index miss or a weight
    /// table miss both fall back to [`DEFAULT_WEIGHT`]. Negative configured
    /// weights resolve to zero. Pure and callable concurrently without
    /// synchronization - the backing tables are read-only after
    /// construction.
    pub fn resolve(&self, address: &str) -> f64 {
        self.by_address
            .get(&normalize_address(address))
            .and_then(|name| self.weights.get(name))
            .map(|weight| weight.max(0.0))
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// The logical service name that owns an address, if it is indexed
    pub fn service_for(&self, address: &str) -> Option<&str> {
        self.by_address
            .get(&normalize_address(address))
            .map(String::as_str)
    }

    /// The per-route candidate lists with discovered overrides applied
    ///
    /// Used to seed the static discovery collaborator for deployments
    /// without an external registry.
    pub fn effective_routes(&self) -> &HashMap<String, Vec<Endpoint>> {
        &self.effective_routes
    }
}

/// Parse a discovered service URL into an endpoint
///
/// Validation already checked the URL shape; a failure here still maps to a
/// configuration error so startup fails loudly rather than serving with a
/// partial index.
fn parse_service_url(name: &str, raw: &str) -> GatewayResult<Endpoint> {
    let url = Url::parse(raw).map_err(|e| {
        GatewayError::config(format!("service_urls['{}'] is not a valid URL: {}", name, e))
    })?;
    let host = url
        .host_str()
        .ok_or_else(|| {
            GatewayError::config(format!("service_urls['{}'] has no host component", name))
        })?
        .to_string();
    let port = url.port_or_known_default().unwrap_or(FALLBACK_PORT);
    Ok(Endpoint::new(host, port))
}
