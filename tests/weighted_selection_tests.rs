//! # Weighted Selection Integration Tests
//!
//! End-to-end tests for the selection core: configuration-driven weight
//! tables, discovery adaptation, and the statistical behavior of the
//! weighted random balancer. Statistical tests use fixed-seed generators so
//! the draws are reproducible.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

use credit_gateway_core::core::config::{DownstreamAddress, RouteConfig};
use credit_gateway_core::core::types::CandidateSet;
use credit_gateway_core::discovery::ServiceDiscovery;
use credit_gateway_core::{
    Endpoint, GatewayConfig, GatewayError, GatewayResult, LoadBalancer, WeightedRandomBalancer,
};

const ROUTE: &str = "credit-applications";

/// Two weighted generators behind one route: A at weight 5, B at weight 1
fn weighted_pair_config(weight_a: f64, weight_b: f64) -> GatewayConfig {
    GatewayConfig {
        generator_services: vec!["generator-a".to_string(), "generator-b".to_string()],
        replica_weights: HashMap::from([
            ("generator-a".to_string(), weight_a),
            ("generator-b".to_string(), weight_b),
        ]),
        routes: vec![RouteConfig {
            id: ROUTE.to_string(),
            downstream: vec![
                DownstreamAddress {
                    host: "localhost".to_string(),
                    port: 5001,
                },
                DownstreamAddress {
                    host: "localhost".to_string(),
                    port: 5002,
                },
            ],
        }],
        ..Default::default()
    }
}

async fn count_draws(
    balancer: &WeightedRandomBalancer,
    rng: &mut StdRng,
    draws: usize,
) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..draws {
        let endpoint = balancer.lease_with_rng(ROUTE, rng).await.unwrap();
        *counts.entry(endpoint.address()).or_default() += 1;
    }
    counts
}

#[tokio::test]
async fn test_five_to_one_split_with_fixed_seed() {
    let balancer = WeightedRandomBalancer::from_config(&weighted_pair_config(5.0, 1.0)).unwrap();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);

    let counts = count_draws(&balancer, &mut rng, 60_000).await;
    let a = counts["localhost:5001"];
    let b = counts["localhost:5002"];

    assert!((a as i64 - 50_000).abs() <= 500, "generator-a drawn {} times", a);
    assert!((b as i64 - 10_000).abs() <= 500, "generator-b drawn {} times", b);
}

#[tokio::test]
async fn test_unmapped_candidates_split_uniformly() {
    // No generator_services and no weights: both candidates resolve to the
    // default weight and selection is uniform.
    let config = GatewayConfig {
        routes: vec![RouteConfig {
            id: ROUTE.to_string(),
            downstream: vec![
                DownstreamAddress {
                    host: "localhost".to_string(),
                    port: 6001,
                },
                DownstreamAddress {
                    host: "localhost".to_string(),
                    port: 6002,
                },
            ],
        }],
        ..Default::default()
    };

    let balancer = WeightedRandomBalancer::from_config(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(31337);

    let draws = 40_000;
    let counts = count_draws(&balancer, &mut rng, draws).await;
    let first = counts["localhost:6001"] as f64 / draws as f64;
    assert!((first - 0.5).abs() < 0.02, "expected ~0.5, got {}", first);
}

#[tokio::test]
async fn test_zero_weight_candidate_is_never_selected() {
    // generator-a is mapped with weight 0; the second candidate is unmapped
    // and carries the default weight, so it owns the entire probability
    // mass.
    let mut config = weighted_pair_config(0.0, 1.0);
    config.generator_services.truncate(1);
    config.replica_weights.remove("generator-b");

    let balancer = WeightedRandomBalancer::from_config(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..2_000 {
        let endpoint = balancer.lease_with_rng(ROUTE, &mut rng).await.unwrap();
        assert_eq!(endpoint, Endpoint::new("localhost", 5002));
    }
}

#[tokio::test]
async fn test_empty_candidate_set_yields_no_candidates_error() {
    let config = GatewayConfig {
        routes: vec![RouteConfig {
            id: ROUTE.to_string(),
            downstream: vec![],
        }],
        ..Default::default()
    };

    let balancer = WeightedRandomBalancer::from_config(&config).unwrap();
    let err = balancer.lease(ROUTE).await.unwrap_err();
    assert!(matches!(err, GatewayError::NoCandidates { .. }));
}

/// Discovery double that always fails, standing in for an unreachable registry
struct FailingDiscovery;

#[async_trait]
impl ServiceDiscovery for FailingDiscovery {
    async fn candidates(&self, _route: &str) -> GatewayResult<CandidateSet> {
        Err(GatewayError::discovery("registry unreachable"))
    }
}

#[tokio::test]
async fn test_discovery_failure_is_surfaced_unchanged() {
    let config = weighted_pair_config(5.0, 1.0);
    let weights =
        Arc::new(credit_gateway_core::WeightSet::from_config(&config).unwrap());
    let balancer = WeightedRandomBalancer::new(Arc::new(FailingDiscovery), weights);

    let err = balancer.lease(ROUTE).await.unwrap_err();
    assert!(matches!(err, GatewayError::Discovery { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_concurrent_leases_share_immutable_tables() {
    let balancer =
        Arc::new(WeightedRandomBalancer::from_config(&weighted_pair_config(5.0, 1.0)).unwrap());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let balancer = Arc::clone(&balancer);
        handles.push(tokio::spawn(async move {
            for _ in 0..500 {
                let endpoint = balancer.lease(ROUTE).await.unwrap();
                assert!(endpoint.port == 5001 || endpoint.port == 5002);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = balancer.get_stats().await;
    assert_eq!(stats.total_selections, 16 * 500);
    assert_eq!(stats.failed_selections, 0);
}

#[tokio::test]
async fn test_discovered_url_override_feeds_selection() {
    // The orchestrator-resolved URL replaces the static slot; leases must
    // return the discovered endpoint, never the stale static one.
    let mut config = weighted_pair_config(5.0, 1.0);
    config.service_urls.insert(
        "generator-a".to_string(),
        "http://10.0.0.5:8080".to_string(),
    );
    config.replica_weights.insert("generator-b".to_string(), 0.0);

    let balancer = WeightedRandomBalancer::from_config(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..500 {
        let endpoint = balancer.lease_with_rng(ROUTE, &mut rng).await.unwrap();
        assert_eq!(endpoint, Endpoint::new("10.0.0.5", 8080));
    }
}
