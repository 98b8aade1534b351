//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` when every dependency is reachable, else `"degraded"`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Database reachability.
    pub database: bool,
    /// Blob store reachability.
    pub storage: bool,
}

/// Result of a share removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnshareResponse {
    /// Grants removed.
    pub removed: u64,
}
