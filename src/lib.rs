//! # Credit Gateway Core - Weighted Endpoint Selection Library
//!
//! This library is the request-routing core of the credit-application API gateway.
//! For every incoming request matched to a logical route, it picks one concrete
//! downstream instance (host:port) out of a dynamically changing candidate set,
//! respecting per-service traffic weights configured at deploy time.
//!
//! The surrounding gateway (HTTP pipeline, route matching, authentication,
//! health probing) is an external collaborator: this crate consumes a candidate
//! list and a weight table, and produces a single chosen endpoint or a typed
//! failure.
//!
//! ## Rust Module System Explained (For Developers from Other Languages)
//!
//! Unlike languages with file-based imports (Python, JavaScript), Rust uses a
//! hierarchical module system:
//!
//! - `mod module_name;` declares a module (like `#include` in C++)
//! - `use module_name::item;` imports specific items (like `import` in Python/JS)
//! - Items are private by default; `pub` makes them public
//! - `pub use` re-exports items to create a convenient public API surface
//!
//! ## Selection Flow
//!
//! 1. Configuration load builds an immutable [`WeightSet`] (service weights
//!    plus an address-to-service index) once at startup
//! 2. Per request: discovery returns the current candidate set for the route
//! 3. Each candidate's weight is resolved through the weight set (default 1.0
//!    for unmapped addresses)
//! 4. Weighted random selection picks one endpoint, proportional to weight

/// Core functionality including error types, configuration, and basic data structures
/// This module contains the fundamental building blocks used throughout the crate
pub mod core;

/// Service discovery contract and the static, configuration-backed implementation
/// External registries (Kubernetes, Consul, ...) plug in behind the same trait
pub mod discovery;

/// Weighted load balancing: weight resolution, the pure selection algorithm,
/// and the per-request balancer facade
pub mod load_balancing;

/// Observability setup: structured logging initialization
pub mod observability;

// Re-export commonly used types for easier access
// Users can write `use credit_gateway_core::GatewayError` instead of
// `use credit_gateway_core::core::error::GatewayError`

/// Main error type and result alias used throughout the crate
pub use crate::core::error::{GatewayError, GatewayResult};

/// Main configuration structure for the selection core
pub use crate::core::config::GatewayConfig;

/// Downstream endpoint type - the unit of selection
pub use crate::core::types::Endpoint;

/// The balancer facade and its trait - the primary entry points for callers
pub use crate::load_balancing::balancer::{LoadBalancer, WeightedRandomBalancer};

/// Immutable weight-resolution tables built from configuration
pub use crate::load_balancing::weights::WeightSet;
