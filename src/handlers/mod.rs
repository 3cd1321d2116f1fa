//! HTTP handlers module
//!
//! Contains all HTTP endpoint handling logic

pub mod health;
pub mod user;

use crate::config::Settings;
use crate::middleware::auth::auth_middleware;
use crate::services::AiService;
use anyhow::Result;
use axum::{http::HeaderValue, middleware, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

/// Application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub ai: AiService,
}

/// Create application router
pub fn create_router(settings: Settings) -> Result<Router> {
    let ai = AiService::new(settings.clone())?;
    create_router_with_service(settings, ai)
}

/// Create application router with an explicitly constructed AI service
///
/// Tests inject a service pointed at a stub provider through this path.
pub fn create_router_with_service(settings: Settings, ai: AiService) -> Result<Router> {
    let app_state = Arc::new(AppState {
        settings: settings.clone(),
        ai,
    });

    let allowed_origins: Vec<HeaderValue> = settings
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Credentialed CORS cannot use wildcards, so methods and headers are
    // mirrored from the request instead
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true),
        );

    let router = Router::new()
        .route("/api/v1/health", get(health::health_check))
        .route("/api/v1/health/ai", get(health::ai_health_check))
        .route("/api/v1/me", get(user::get_me))
        .layer(middleware::from_fn(auth_middleware))
        .with_state(app_state)
        .layer(middleware_stack);

    Ok(router)
}
