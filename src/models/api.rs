//! HTTP API data models
//!
//! Response bodies served by this backend's own endpoints

use serde::{Deserialize, Serialize};

/// Basic health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Timestamp (RFC3339)
    pub timestamp: String,
    /// Deployment environment
    pub environment: String,
    /// Version information
    pub version: String,
}

/// AI connectivity probe result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiHealthStatus {
    /// Overall status: healthy or degraded
    pub status: String,
    /// Chat completion sub-check: ok or failed
    pub chat_completion: String,
    /// Embeddings sub-check: ok or failed
    pub embeddings: String,
    /// Provider endpoint checked
    pub endpoint: String,
}

/// Response for the example protected endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    /// Whether the request carried valid credentials
    pub authenticated: bool,
    /// Greeting message
    pub message: String,
}
