//! Error handling module
//!
//! Defines the application error taxonomy and the provider failure
//! classification that drives retry decisions

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed provider call
///
/// Retry decisions are made on this enumeration, never on raw library
/// error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider throttled the request (HTTP 429)
    RateLimited,
    /// The individual network attempt exceeded its timeout
    Timeout,
    /// The connection to the provider could not be established
    ConnectionFailure,
    /// Upstream rejected the request itself (4xx, excluding 429)
    ClientError(u16),
    /// Upstream failed while handling the request (5xx)
    ServerError(u16),
    /// Transport-level failure that fits no other bucket
    Unclassified,
}

impl FailureKind {
    /// Whether a failure of this kind is expected to resolve on retry
    ///
    /// 429 is a 4xx but is treated as transient: throttling clears on its
    /// own, while other client errors will fail identically every time.
    pub fn is_transient(&self) -> bool {
        match self {
            FailureKind::RateLimited
            | FailureKind::Timeout
            | FailureKind::ConnectionFailure
            | FailureKind::ServerError(_)
            | FailureKind::Unclassified => true,
            FailureKind::ClientError(_) => false,
        }
    }

    /// Classify an upstream HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FailureKind::RateLimited,
            400..=499 => FailureKind::ClientError(status),
            500..=599 => FailureKind::ServerError(status),
            _ => FailureKind::Unclassified,
        }
    }

    /// Classify a reqwest transport error
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FailureKind::Timeout
        } else if error.is_connect() {
            FailureKind::ConnectionFailure
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16())
        } else {
            FailureKind::Unclassified
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate_limited"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::ConnectionFailure => write!(f, "connection_failure"),
            FailureKind::ClientError(status) => write!(f, "client_error({})", status),
            FailureKind::ServerError(status) => write!(f, "server_error({})", status),
            FailureKind::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Required configuration missing or invalid at startup
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Classified provider call failure
    #[error("Provider error ({kind}): {message}")]
    Provider { kind: FailureKind, message: String },

    /// JSON-mode completion returned text that is not valid JSON
    #[error("Invalid JSON response from model: {message}")]
    Parse { message: String, raw: String },

    /// Provider unreachable during a health probe
    #[error("AI service unavailable: {0}")]
    Unreachable(String),
}

impl AppError {
    /// Build a provider error from an upstream HTTP status and message
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        AppError::Provider {
            kind: FailureKind::from_status(status),
            message: message.into(),
        }
    }

    /// The classification of this error, if it is a provider failure
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            AppError::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Whether the retry core may re-attempt the operation
    pub fn is_transient(&self) -> bool {
        self.failure_kind().is_some_and(|kind| kind.is_transient())
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::Provider { kind, .. } => match kind {
                FailureKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                FailureKind::ClientError(_)
                | FailureKind::ServerError(_)
                | FailureKind::ConnectionFailure
                | FailureKind::Unclassified => StatusCode::BAD_GATEWAY,
            },
            AppError::Parse { .. } => StatusCode::BAD_GATEWAY,
            AppError::Unreachable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "authentication_error",
            AppError::Provider { kind, .. } => match kind {
                FailureKind::RateLimited => "rate_limit_error",
                FailureKind::Timeout => "timeout_error",
                FailureKind::ClientError(_) => "invalid_request_error",
                FailureKind::ServerError(_)
                | FailureKind::ConnectionFailure
                | FailureKind::Unclassified => "api_error",
            },
            AppError::Parse { .. } => "parse_error",
            AppError::Unreachable(_) => "overloaded_error",
            AppError::Config(_) => "api_error",
        }
    }
}

/// Error response body returned to HTTP callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::Authentication(_) => {
                tracing::warn!("Client error: {} - Status code: {}", self.error_type(), status);
            }
            _ => {
                tracing::error!("Application error: {} - Status code: {}", self, status);
            }
        }

        let body = ErrorResponse {
            error_type: self.error_type().to_string(),
            detail: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;
