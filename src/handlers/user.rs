//! User handlers
//!
//! Example protected endpoint demonstrating the auth middleware

use crate::models::api::MeResponse;
use axum::response::Json;
use tracing::debug;

/// Get current user info
///
/// GET /api/v1/me
/// Reaching this handler means the auth middleware accepted the token.
pub async fn get_me() -> Json<MeResponse> {
    debug!("Returning current user info");

    Json(MeResponse {
        authenticated: true,
        message: "You are authenticated!".to_string(),
    })
}
