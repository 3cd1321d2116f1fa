//! AI operations service
//!
//! Named operations (embeddings, chat completion, JSON-mode completion,
//! quick analysis) built on the provider client and the retry core.
//! Each operation builds a provider-call closure, runs it through
//! `with_retry`, and normalizes the response.

use crate::config::Settings;
use crate::models::provider::{
    ChatCompletionRequest, ChatMessage, EmbeddingRequest, ResponseFormat,
};
use crate::services::client::ProviderClient;
use crate::services::retry::{with_retry, RetryPolicy};
use crate::utils::error::{AppError, AppResult};
use tracing::error;

/// A completion request as seen by callers of the service
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation, in prompt order
    pub messages: Vec<ChatMessage>,
    /// Logical model name or deployment override (defaults to the main
    /// chat deployment)
    pub model: Option<String>,
    /// Sampling temperature (0-2)
    pub temperature: f32,
    /// Maximum tokens in the response
    pub max_tokens: u32,
    /// Constrain output to a single well-formed JSON object
    pub json_mode: bool,
}

impl CompletionRequest {
    /// Plain-text completion with default sampling
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: 0.7,
            max_tokens: 1000,
            json_mode: false,
        }
    }

    /// JSON-mode completion; lower temperature favors deterministic output
    pub fn json(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: 0.3,
            max_tokens: 2000,
            json_mode: true,
        }
    }

    /// Override the target model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Override the maximum response size
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// AI operations over the provider client
///
/// Immutable after construction; clones share the underlying client
/// handles and can run concurrently without coordination.
#[derive(Debug, Clone)]
pub struct AiService {
    client: ProviderClient,
    settings: Settings,
    policy: RetryPolicy,
}

impl AiService {
    /// Create the service from settings with the default retry policy
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client = ProviderClient::new(&settings)?;
        Ok(Self {
            client,
            settings,
            policy: RetryPolicy::default(),
        })
    }

    /// Create the service with an explicit client and retry policy
    pub fn with_policy(settings: Settings, client: ProviderClient, policy: RetryPolicy) -> Self {
        Self {
            client,
            settings,
            policy,
        }
    }

    /// The underlying provider client (used by the health probe)
    pub fn client(&self) -> &ProviderClient {
        &self.client
    }

    /// Generate an embedding vector for a single text
    pub async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| AppError::Provider {
            kind: crate::utils::error::FailureKind::Unclassified,
            message: "Embedding response contained no vectors".to_string(),
        })
    }

    /// Generate embeddings for multiple texts in a single provider call
    ///
    /// The output order matches the input order; the call fails as a whole
    /// after retry exhaustion, never returning partial results.
    pub async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let deployment = self.settings.azure.deployment_embedding.clone();
        let request = EmbeddingRequest {
            input: texts.to_vec(),
        };

        let response = with_retry("generate_embeddings", &self.policy, || {
            self.client.embeddings(&deployment, &request)
        })
        .await?;

        if response.data.len() != texts.len() {
            return Err(AppError::Provider {
                kind: crate::utils::error::FailureKind::Unclassified,
                message: format!(
                    "Embedding count mismatch: {} inputs, {} vectors",
                    texts.len(),
                    response.data.len()
                ),
            });
        }

        // The provider tags each vector with its input position
        let mut data = response.data;
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    /// Generate a chat completion and return the assistant's text
    pub async fn complete(&self, request: &CompletionRequest) -> AppResult<String> {
        let deployment = self.resolve_deployment(request.model.as_deref())?;

        let wire_request = ChatCompletionRequest {
            messages: request.messages.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then(ResponseFormat::json_object),
        };

        let response = with_retry("chat_completion", &self.policy, || {
            self.client.chat_completions(&deployment, &wire_request)
        })
        .await?;

        Ok(response.first_content())
    }

    /// Generate a chat completion constrained to a JSON object
    ///
    /// Parse failure carries the raw model output and is never retried:
    /// re-running the same request cannot fix malformed output.
    pub async fn complete_json(&self, request: &CompletionRequest) -> AppResult<serde_json::Value> {
        let mut request = request.clone();
        request.json_mode = true;

        let content = self.complete(&request).await?;

        serde_json::from_str(&content).map_err(|e| {
            error!("Failed to parse JSON response: {}", e);
            error!("Raw content: {}", content);
            AppError::Parse {
                message: e.to_string(),
                raw: content,
            }
        })
    }

    /// Quick analysis of a text with the fast model
    ///
    /// Builds a two-message conversation (system = instruction, user =
    /// text) and completes it with a small output bound.
    pub async fn quick_analysis(
        &self,
        text: &str,
        instruction: &str,
        model: Option<&str>,
    ) -> AppResult<String> {
        let deployment = match model {
            Some(name) => name.to_string(),
            None => self.settings.azure.deployment_chat_mini.clone(),
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(instruction),
            ChatMessage::user(text),
        ])
        .with_model(deployment)
        .with_temperature(0.3)
        .with_max_tokens(500);

        self.complete(&request).await
    }

    /// Resolve an optional model override to a deployment name
    fn resolve_deployment(&self, model: Option<&str>) -> AppResult<String> {
        match model {
            None => Ok(self.settings.azure.deployment_chat.clone()),
            Some(name) => self.settings.deployment_for(name).ok_or_else(|| {
                AppError::Provider {
                    kind: crate::utils::error::FailureKind::ClientError(400),
                    message: format!("Unknown model name: {}", name),
                }
            }),
        }
    }
}
