//! # Balancer Facade
//!
//! The per-request orchestrator: obtain the route's current candidate set
//! from the discovery collaborator, resolve each candidate's weight through
//! the immutable weight tables, run weighted random selection, and hand the
//! chosen endpoint back to the proxy pipeline.
//!
//! ## Rust Concepts Explained
//!
//! - `Arc<T>` (Atomically Reference Counted) allows multiple owners of the same data
//! - `AtomicU64` provides thread-safe counters without locks
//! - `DashMap` is a concurrent HashMap for the per-endpoint statistics
//! - `async_trait` enables async methods in traits
//! - `Send + Sync` bounds ensure the balancer can be shared across request tasks
//!
//! The facade holds no long-lived mutable state beyond observational
//! counters; the weight tables are read-only after startup, so many
//! in-flight requests can lease endpoints concurrently without
//! synchronization on the selection path.

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::{counter, histogram};
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::core::config::GatewayConfig;
use crate::core::error::{GatewayError, GatewayResult};
use crate::core::types::Endpoint;
use crate::discovery::service_discovery::{ServiceDiscovery, StaticDiscovery};
use crate::load_balancing::selector;
use crate::load_balancing::weights::WeightSet;

/// Core trait for endpoint leasing
///
/// One operation exposed to the surrounding gateway: given a route
/// identifier, return one downstream endpoint or a typed failure. Invoked
/// once per forwarded request, before the proxy performs the actual network
/// call.
#[async_trait]
pub trait LoadBalancer: Send + Sync {
    /// Lease one endpoint for a single request on the given route
    ///
    /// # Errors
    /// * [`GatewayError::NoCandidates`] - the route's candidate set is empty;
    ///   the caller must not attempt a network call
    /// * [`GatewayError::Discovery`] - the discovery collaborator failed;
    ///   surfaced unchanged, never retried here
    async fn lease(&self, route: &str) -> GatewayResult<Endpoint>;

    /// Get the algorithm name for metrics and logging
    fn algorithm_name(&self) -> &'static str;

    /// Get current statistics for this balancer
    async fn get_stats(&self) -> LoadBalancerStats;

    /// Reset internal statistics (useful for testing or reconfiguration)
    async fn reset(&self);
}

/// Balancer statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoadBalancerStats {
    pub algorithm: String,
    pub total_requests: u64,
    pub total_selections: u64,
    pub failed_selections: u64,
    pub endpoint_stats: HashMap<String, EndpointStats>,
}

/// Per-endpoint statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct EndpointStats {
    pub selections: u64,
    pub last_selected: Option<chrono::DateTime<chrono::Utc>>,
}

/// Weighted random balancer
///
/// Distributes leases across a route's candidates proportionally to the
/// weights configured per logical service. Candidates whose address maps to
/// no weighted service participate with the default weight, so newly
/// discovered instances receive traffic before they appear in the weight
/// configuration.
pub struct WeightedRandomBalancer {
    discovery: Arc<dyn ServiceDiscovery>,
    weights: Arc<WeightSet>,
    stats: DashMap<String, EndpointStats>,
    total_requests: AtomicU64,
    total_selections: AtomicU64,
    failed_selections: AtomicU64,
}

impl WeightedRandomBalancer {
    /// Create a balancer over an explicit discovery collaborator
    pub fn new(discovery: Arc<dyn ServiceDiscovery>, weights: Arc<WeightSet>) -> Self {
        Self {
            discovery,
            weights,
            stats: DashMap::new(),
            total_requests: AtomicU64::new(0),
            total_selections: AtomicU64::new(0),
            failed_selections: AtomicU64::new(0),
        }
    }

    /// Build a balancer straight from configuration
    ///
    /// Constructs the weight tables and seeds a [`StaticDiscovery`] from the
    /// effective route table. This is the startup path for deployments
    /// without an external registry.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        let weights = Arc::new(WeightSet::from_config(config)?);
        let discovery = Arc::new(StaticDiscovery::from_routes(weights.effective_routes()));
        Ok(Self::new(discovery, weights))
    }

    /// The weight tables backing this balancer
    pub fn weights(&self) -> &WeightSet {
        &self.weights
    }

    /// Lease an endpoint using a caller-supplied random source
    ///
    /// Used by tests and property checks that need reproducible draws; the
    /// distribution depends only on the uniformity of the source, not on
    /// generator identity.
    pub async fn lease_with_rng<R>(&self, route: &str, rng: &mut R) -> GatewayResult<Endpoint>
    where
        R: Rng + Send,
    {
        let candidates = self.fetch_candidates(route).await?;
        self.select_from(route, &candidates, rng)
    }

    async fn fetch_candidates(&self, route: &str) -> GatewayResult<Vec<Endpoint>> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        // Discovery may block or fail; failure is surfaced unchanged and
        // caller cancellation simply stops the wait - there is no shared
        // mutable state on this path to roll back.
        match self.discovery.candidates(route).await {
            Ok(candidates) => Ok(candidates),
            Err(err) => {
                self.failed_selections.fetch_add(1, Ordering::Relaxed);
                counter!("load_balancer_discovery_errors").increment(1);
                warn!(route = %route, error = %err, "Discovery lookup failed during lease");
                Err(err)
            }
        }
    }

    /// Run weighted selection over an already-fetched candidate set
    fn select_from<R>(
        &self,
        route: &str,
        candidates: &[Endpoint],
        rng: &mut R,
    ) -> GatewayResult<Endpoint>
    where
        R: Rng,
    {
        let start = Instant::now();

        let Some(index) = selector::choose(
            candidates,
            |endpoint| self.weights.resolve(&endpoint.address()),
            rng,
        ) else {
            self.failed_selections.fetch_add(1, Ordering::Relaxed);
            counter!("load_balancer_failed_selections").increment(1);
            debug!(route = %route, "Lease failed: empty candidate set");
            return Err(GatewayError::no_candidates(route));
        };

        let selected = candidates[index].clone();
        self.update_stats(&selected.address());
        self.total_selections.fetch_add(1, Ordering::Relaxed);

        counter!("load_balancer_selections").increment(1);
        histogram!("load_balancer_selection_duration").record(start.elapsed().as_secs_f64());

        debug!(
            route = %route,
            endpoint = %selected.address(),
            service = self.weights.service_for(&selected.address()).unwrap_or("<unmapped>"),
            weight = self.weights.resolve(&selected.address()),
            candidates = candidates.len(),
            algorithm = "weighted_random",
            "Leased endpoint for request"
        );

        Ok(selected)
    }

    /// Update per-endpoint statistics
    fn update_stats(&self, address: &str) {
        let mut stats = self
            .stats
            .entry(address.to_string())
            .or_insert_with(|| EndpointStats {
                selections: 0,
                last_selected: None,
            });
        stats.selections += 1;
        stats.last_selected = Some(chrono::Utc::now());
    }
}

#[async_trait]
impl LoadBalancer for WeightedRandomBalancer {
    async fn lease(&self, route: &str) -> GatewayResult<Endpoint> {
        let candidates = self.fetch_candidates(route).await?;
        // thread_rng is created after the await so the future stays Send;
        // per-call generators also mean no shared randomness state.
        let mut rng = rand::thread_rng();
        self.select_from(route, &candidates, &mut rng)
    }

    fn algorithm_name(&self) -> &'static str {
        "weighted_random"
    }

    async fn get_stats(&self) -> LoadBalancerStats {
        let endpoint_stats = self
            .stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        LoadBalancerStats {
            algorithm: self.algorithm_name().to_string(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            total_selections: self.total_selections.load(Ordering::Relaxed),
            failed_selections: self.failed_selections.load(Ordering::Relaxed),
            endpoint_stats,
        }
    }

    async fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.total_selections.store(0, Ordering::Relaxed);
        self.failed_selections.store(0, Ordering::Relaxed);
        self.stats.clear();
    }
}
