//! Business logic services module
//!
//! Contains the provider client, the retry core, and the AI operations
//! built on top of them

pub mod ai;
pub mod client;
pub mod retry;

pub use ai::{AiService, CompletionRequest};
pub use client::ProviderClient;
pub use retry::{with_retry, RetryPolicy};
