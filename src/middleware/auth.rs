//! Authentication middleware
//!
//! Bearer-token validation for protected endpoints. Token checking is a
//! development stub; production deployments are expected to verify the
//! JWT against the identity provider.

use crate::utils::error::AppError;
use axum::{
    body::Body,
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Authentication middleware
///
/// Requires a bearer token on every route except the health endpoints.
pub async fn auth_middleware(
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path();

    // Health checks stay open for load balancers and monitoring
    if path.starts_with("/api/v1/health") || path == "/" {
        return Ok(next.run(request).await);
    }

    let token = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    match token {
        Some(token) if validate_token_format(token) => {
            debug!("Authentication successful");
            Ok(next.run(request).await)
        }
        Some(_) => {
            warn!("Invalid authentication token");
            Err(AppError::Authentication(
                "Invalid authentication token".to_string(),
            ))
        }
        None => {
            warn!("Missing authentication token");
            Err(AppError::Authentication(
                "Missing authentication token".to_string(),
            ))
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

/// Validate token format
///
/// Stub check only: non-empty, no whitespace, minimal length. Real JWT
/// validation belongs at the identity-provider boundary.
pub fn validate_token_format(token: &str) -> bool {
    token.len() >= 8 && !token.contains(char::is_whitespace)
}
