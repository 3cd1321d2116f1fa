//! Health check handlers
//!
//! Basic service health plus the AI connectivity probe

use crate::handlers::AppState;
use crate::models::api::{AiHealthStatus, HealthResponse};
use crate::utils::error::AppResult;
use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::debug;

/// Basic health check
///
/// GET /api/v1/health
/// Used by load balancers and monitoring systems; checks nothing external.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing health check");

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.settings.server.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// AI service health check
///
/// GET /api/v1/health/ai
/// Validates both the chat and embedding deployments with one minimal call
/// each. An unreachable provider maps to 503 via the error taxonomy.
pub async fn ai_health_check(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<AiHealthStatus>> {
    debug!("Executing AI health check");

    let status = state.ai.client().validate_connection().await?;
    Ok(Json(status))
}
