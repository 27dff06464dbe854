//! # Error Handling Module
//!
//! This module provides error handling for the selection core using the
//! `thiserror` crate. It defines all error types that can cross the component
//! boundary and provides proper HTTP status code mappings so the embedding
//! gateway can translate failures into client responses.
//!
//! ## Rust Error Handling Concepts (For Developers from Other Languages)
//!
//! Rust doesn't use exceptions. Failures are values of type `Result<T, E>`:
//! - `Ok(value)` represents success
//! - `Err(error)` represents failure
//! - The `?` operator propagates errors to the caller (like a typed rethrow)
//!
//! The `thiserror` crate generates the `Display` and `Error` trait
//! implementations from the `#[error("...")]` attributes below, and `From`
//! conversions let `?` convert library errors into `GatewayError`
//! automatically.

use http::StatusCode;
use thiserror::Error;

/// Main result type used throughout the crate
///
/// A type alias so call sites can write `GatewayResult<Endpoint>` instead of
/// `Result<Endpoint, GatewayError>`.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error types for the weighted selection core
///
/// Each variant represents a different failure category. Selection itself
/// (`selector::choose`) never fails on a non-empty candidate list; these
/// errors describe empty candidate sets, discovery failures, and startup
/// configuration problems.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// The discovered/configured candidate set for a route is empty
    ///
    /// Reported to the caller, which must translate it into a
    /// service-unavailable response. Never retried internally.
    #[error("No downstream candidates available for route '{route}'")]
    NoCandidates { route: String },

    /// The external discovery collaborator failed or timed out
    ///
    /// Surfaced unchanged; retry policy belongs to the discovery
    /// collaborator or the proxy layer, not this core.
    #[error("Service discovery error: {message}")]
    Discovery { message: String },

    /// Malformed weight or address configuration detected at startup
    ///
    /// Fatal: the process must not serve traffic with an inconsistent
    /// weight table.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O errors while reading configuration files
    #[error("I/O error: {message}")]
    Io { message: String },

    /// JSON parsing errors for configuration files
    #[error("JSON error: {message}")]
    Json { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },
}

impl GatewayError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a discovery error with a custom message
    pub fn discovery<S: Into<String>>(message: S) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Create a no-candidates error for a route
    pub fn no_candidates<S: Into<String>>(route: S) -> Self {
        Self::NoCandidates {
            route: route.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    ///
    /// The embedding gateway uses this mapping when turning a failed lease
    /// into a client response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoCandidates { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Discovery { .. } => StatusCode::BAD_GATEWAY,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Json { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be retried by the caller
    ///
    /// Discovery failures are transient; an empty candidate set is reported
    /// as-is and left to the caller's availability handling, and
    /// configuration errors are fatal at startup.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Discovery { .. })
    }

    /// Get a string representation of the error type for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NoCandidates { .. } => "no_candidates",
            Self::Discovery { .. } => "service_discovery_error",
            Self::Configuration { .. } => "configuration_error",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::Yaml { .. } => "yaml_error",
        }
    }
}

/// Implement conversion from std::io::Error
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Implement conversion from serde_json::Error
impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}

/// Implement conversion from serde_yaml::Error
impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}
