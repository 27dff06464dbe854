//! # Core Types Module
//!
//! This module defines the foundational data structures used throughout the
//! selection core: the downstream endpoint and the per-request candidate set.
//!
//! ## Rust Ownership Concepts in This Module
//!
//! - `Clone` enables creating copies of endpoints handed back to callers
//! - `PartialEq`/`Eq`/`Hash` let endpoints be used as map keys by their identity
//! - serde derives allow endpoints to appear directly in configuration files

use serde::{Deserialize, Serialize};
use std::fmt;

/// One concrete downstream instance that can serve a route
///
/// An endpoint's identity is its normalized address string (`"host:port"`,
/// host lowercased). Endpoints carry no lifecycle of their own: they are
/// created fresh from each discovery response and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname or IP address of the downstream instance
    pub host: String,
    /// TCP port the instance listens on
    pub port: u16,
}

impl Endpoint {
    /// Create a new endpoint from a host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The normalized address string that identifies this endpoint
    ///
    /// Hostnames are case-insensitive, so the host part is lowercased to make
    /// address comparison and index lookups stable regardless of how the
    /// address was spelled in configuration or discovery output.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host.to_ascii_lowercase(), self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// The ordered candidate list discovery reports for a route at one instant
///
/// Transient by design: recomputed on every selection request, with no
/// identity beyond the request it serves. Selection depends only on the
/// order of this sequence, never on any map iteration order.
pub type CandidateSet = Vec<Endpoint>;
