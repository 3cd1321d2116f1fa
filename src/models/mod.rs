//! Data models module
//!
//! Contains provider wire structures and HTTP API structures

pub mod api;
pub mod provider;

pub use api::{AiHealthStatus, HealthResponse, MeResponse};
pub use provider::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, EmbeddingRequest,
    EmbeddingResponse, ResponseFormat, Role,
};
