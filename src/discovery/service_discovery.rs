//! # Service Discovery Module
//!
//! The output contract of service discovery as consumed by the selection
//! core, plus the static, configuration-backed implementation used in
//! deployments without an external registry and as the test double.
//!
//! Discovery backends themselves (Kubernetes, Consul, ...) live outside this
//! crate; anything that can answer "which endpoints currently serve this
//! route" plugs in behind the [`ServiceDiscovery`] trait.
//!
//! ## Rust Concepts Used
//!
//! - `async_trait` for async methods in traits
//! - `DashMap` for thread-safe concurrent access to the route table
//! - `Arc<dyn ServiceDiscovery>` for sharing one collaborator across requests

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::{CandidateSet, Endpoint};

/// The discovery contract consumed by the balancer
///
/// Implementations report the currently live, ordered candidate set for a
/// route. The order must be stable for a given snapshot: selection
/// reproducibility depends on the supplied sequence order.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// The current candidate endpoints for a route
    ///
    /// An empty list for a known route is a valid answer (the balancer turns
    /// it into its no-candidates failure). An unknown route or a backend
    /// failure is a [`GatewayError::Discovery`].
    async fn candidates(&self, route: &str) -> GatewayResult<CandidateSet>;
}

/// Static, configuration-backed discovery
///
/// Routes and their candidates are seeded from the effective route table at
/// startup; an external poller may refresh them at runtime through
/// [`update_route`](StaticDiscovery::update_route). Suitable for simple
/// deployments and testing.
pub struct StaticDiscovery {
    routes: DashMap<String, Vec<Endpoint>>,
}

impl StaticDiscovery {
    /// Create an empty discovery table
    pub fn new() -> Self {
        Self {
            routes: DashMap::new(),
        }
    }

    /// Seed the table from a route -> candidates map
    pub fn from_routes(routes: &HashMap<String, Vec<Endpoint>>) -> Self {
        let discovery = Self::new();
        for (route, candidates) in routes {
            discovery.routes.insert(route.clone(), candidates.clone());
        }
        info!(routes = routes.len(), "Seeded static service discovery");
        discovery
    }

    /// Replace the candidate set for a route
    pub fn update_route(&self, route: impl Into<String>, candidates: Vec<Endpoint>) {
        let route = route.into();
        debug!(
            route = %route,
            candidates = candidates.len(),
            "Updated static discovery route"
        );
        self.routes.insert(route, candidates);
    }

    /// Remove a route from the table
    pub fn remove_route(&self, route: &str) -> bool {
        self.routes.remove(route).is_some()
    }
}

impl Default for StaticDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn candidates(&self, route: &str) -> GatewayResult<CandidateSet> {
        self.routes
            .get(route)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GatewayError::discovery(format!("Unknown route: {}", route)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_route_returns_candidates_in_order() {
        let discovery = StaticDiscovery::new();
        discovery.update_route(
            "credit-applications",
            vec![
                Endpoint::new("localhost", 5001),
                Endpoint::new("localhost", 5002),
            ],
        );

        let candidates = discovery.candidates("credit-applications").await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].port, 5001);
        assert_eq!(candidates[1].port, 5002);
    }

    #[tokio::test]
    async fn test_empty_route_is_a_valid_answer() {
        let discovery = StaticDiscovery::new();
        discovery.update_route("drained", vec![]);
        assert!(discovery.candidates("drained").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_a_discovery_error() {
        let discovery = StaticDiscovery::new();
        let err = discovery.candidates("missing").await.unwrap_err();
        assert!(matches!(err, GatewayError::Discovery { .. }));
    }

    #[tokio::test]
    async fn test_remove_route() {
        let discovery = StaticDiscovery::new();
        discovery.update_route("credit-applications", vec![Endpoint::new("localhost", 5001)]);
        assert!(discovery.remove_route("credit-applications"));
        assert!(!discovery.remove_route("credit-applications"));
        assert!(discovery.candidates("credit-applications").await.is_err());
    }
}
