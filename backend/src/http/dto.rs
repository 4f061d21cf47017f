//! Data Transfer Objects for the HTTP API.
//!
//! Route payloads live in [`crate::api`]; this module only holds the shapes
//! specific to the HTTP layer.

use serde::{Deserialize, Serialize};

// Re-export the route payloads for handler signatures
pub use crate::api::{ItemsResponse, UserResponse, UserSuggestResponse};

/// Raw query string pairs, in request order.
pub type QueryPairs = Vec<(String, String)>;

/// First value of `key`, mirroring how form values are read.
pub fn first_param<'a>(pairs: &'a QueryPairs, key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Database connection status
    pub database: String,
}
