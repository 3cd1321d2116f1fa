//! AI Backend Library
//!
//! Backend service template backed by Azure OpenAI: resilient chat
//! completion, JSON-mode completion, and text embeddings behind a small
//! HTTP surface

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export common types
pub use config::Settings;
pub use handlers::{create_router, create_router_with_service, AppState};
pub use models::provider::{ChatMessage, Role};
pub use services::{AiService, CompletionRequest, ProviderClient, RetryPolicy};
pub use utils::error::{AppError, AppResult, FailureKind};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
