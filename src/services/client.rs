//! Provider client service
//!
//! Encapsulates HTTP communication with the Azure OpenAI deployments.
//! Built once at startup from the configuration; immutable and cheaply
//! cloneable, so concurrent calls share it without coordination.

use crate::config::Settings;
use crate::models::api::AiHealthStatus;
use crate::models::provider::*;
use crate::utils::error::{AppError, AppResult, FailureKind};
use anyhow::Context;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Azure OpenAI client
///
/// Holds separate handles for chat and embedding calls since the two
/// endpoint families are versioned independently.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    chat_client: Client,
    embedding_client: Client,
    endpoint: String,
    api_key: String,
    chat_api_version: String,
    embedding_api_version: String,
    chat_mini_deployment: String,
    embedding_deployment: String,
}

impl ProviderClient {
    /// Create a new client instance from settings
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.azure.timeout);

        let chat_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aibackend/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create chat HTTP client")?;

        let embedding_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("aibackend/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create embedding HTTP client")?;

        Ok(Self {
            chat_client,
            embedding_client,
            endpoint: settings.azure.endpoint.trim_end_matches('/').to_string(),
            api_key: settings.azure.api_key.clone(),
            chat_api_version: settings.azure.chat_api_version.clone(),
            embedding_api_version: settings.azure.embedding_api_version.clone(),
            chat_mini_deployment: settings.azure.deployment_chat_mini.clone(),
            embedding_deployment: settings.azure.deployment_embedding.clone(),
        })
    }

    /// The provider endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn chat_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, deployment, self.chat_api_version
        )
    }

    fn embeddings_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/embeddings?api-version={}",
            self.endpoint, deployment, self.embedding_api_version
        )
    }

    /// Send a chat completion request to the given deployment
    pub async fn chat_completions(
        &self,
        deployment: &str,
        request: &ChatCompletionRequest,
    ) -> AppResult<ChatCompletionResponse> {
        debug!("Sending chat completion request to deployment {}", deployment);

        let response = self
            .chat_client
            .post(self.chat_url(deployment))
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        handle_response(response).await
    }

    /// Send an embedding request to the given deployment
    pub async fn embeddings(
        &self,
        deployment: &str,
        request: &EmbeddingRequest,
    ) -> AppResult<EmbeddingResponse> {
        debug!(
            "Sending embedding request for {} texts to deployment {}",
            request.input.len(),
            deployment
        );

        let response = self
            .embedding_client
            .post(self.embeddings_url(deployment))
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        handle_response(response).await
    }

    /// Validate provider connectivity
    ///
    /// Issues one minimal chat call and one minimal embedding call with no
    /// retry. A transport failure propagates as `Unreachable`; an upstream
    /// error or empty content marks the sub-check failed and the overall
    /// status degraded.
    pub async fn validate_connection(&self) -> AppResult<AiHealthStatus> {
        debug!("Validating Azure OpenAI connection");

        let chat_request = ChatCompletionRequest {
            messages: vec![ChatMessage::user("Hello")],
            temperature: 0.0,
            max_tokens: 5,
            response_format: None,
        };

        let chat_ok = match self
            .chat_completions(&self.chat_mini_deployment, &chat_request)
            .await
        {
            Ok(response) => !response.first_content().is_empty(),
            Err(err) => {
                if is_unreachable(&err) {
                    error!("Azure OpenAI validation failed: {}", err);
                    return Err(AppError::Unreachable(err.to_string()));
                }
                warn!("Chat completion probe failed: {}", err);
                false
            }
        };

        let embedding_request = EmbeddingRequest {
            input: vec!["test".to_string()],
        };

        let embedding_ok = match self
            .embeddings(&self.embedding_deployment, &embedding_request)
            .await
        {
            Ok(response) => response
                .data
                .first()
                .map(|data| !data.embedding.is_empty())
                .unwrap_or(false),
            Err(err) => {
                if is_unreachable(&err) {
                    error!("Azure OpenAI validation failed: {}", err);
                    return Err(AppError::Unreachable(err.to_string()));
                }
                warn!("Embedding probe failed: {}", err);
                false
            }
        };

        let status = if chat_ok && embedding_ok {
            "healthy"
        } else {
            "degraded"
        };

        Ok(AiHealthStatus {
            status: status.to_string(),
            chat_completion: if chat_ok { "ok" } else { "failed" }.to_string(),
            embeddings: if embedding_ok { "ok" } else { "failed" }.to_string(),
            endpoint: self.endpoint.clone(),
        })
    }
}

/// Classify a reqwest transport error into a provider failure
fn classify_transport_error(error: reqwest::Error) -> AppError {
    AppError::Provider {
        kind: FailureKind::from_transport(&error),
        message: error.to_string(),
    }
}

/// Whether a probe-level failure means the provider cannot be reached
fn is_unreachable(error: &AppError) -> bool {
    matches!(
        error.failure_kind(),
        Some(FailureKind::Timeout)
            | Some(FailureKind::ConnectionFailure)
            | Some(FailureKind::Unclassified)
    )
}

/// Deserialize a successful response or classify the failure status
async fn handle_response<T: serde::de::DeserializeOwned>(response: Response) -> AppResult<T> {
    let status = response.status();

    if status.is_success() {
        let parsed: T = response.json().await.map_err(|e| AppError::Provider {
            kind: FailureKind::Unclassified,
            message: format!("Failed to parse provider response: {}", e),
        })?;
        debug!("Provider request completed successfully");
        Ok(parsed)
    } else {
        let error_text = response.text().await.unwrap_or_default();

        // Prefer the provider's own error message when the body parses
        let message = match serde_json::from_str::<ProviderErrorResponse>(&error_text) {
            Ok(body) => body.error.message,
            Err(_) => format!("{} - {}", status, error_text),
        };

        error!("Provider request failed: {} - {}", status, message);
        Err(AppError::from_status(status.as_u16(), message))
    }
}
