//! Application configuration settings
//!
//! Defines all configuration structures and loading logic. Provider
//! connection parameters are resolved once at startup; a missing required
//! value is a fatal error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server configuration
    pub server: ServerConfig,
    /// Azure OpenAI configuration
    pub azure: AzureConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Deployment environment name (development/production)
    pub environment: String,
}

/// Azure OpenAI connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Endpoint URL
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// API version for chat completions
    pub chat_api_version: String,
    /// API version for embeddings
    pub embedding_api_version: String,
    /// Main chat model deployment name
    pub deployment_chat: String,
    /// Fast/cheap chat model deployment name
    pub deployment_chat_mini: String,
    /// Embedding model deployment name
    pub deployment_embedding: String,
    /// Per-attempt request timeout in seconds
    pub timeout: u64,
}

/// Security configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Allowed origins for CORS
    pub allowed_origins: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Settings {
    /// Create a new configuration instance from the environment
    pub fn new() -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let settings = Self {
            server: ServerConfig {
                host: get_env_or_default("SERVER_HOST", "0.0.0.0"),
                port: get_env_or_default("SERVER_PORT", "8000")
                    .parse()
                    .context("Invalid port number")?,
                environment: get_env_or_default("ENVIRONMENT", "development"),
            },
            azure: AzureConfig {
                endpoint: get_required_env("AZURE_OPENAI_ENDPOINT")?,
                api_key: get_required_env("AZURE_OPENAI_KEY")?,
                chat_api_version: get_env_or_default(
                    "AZURE_OPENAI_API_VERSION",
                    "2024-12-01-preview",
                ),
                embedding_api_version: get_env_or_default(
                    "AZURE_OPENAI_EMBEDDING_API_VERSION",
                    "2023-05-15",
                ),
                deployment_chat: get_env_or_default("AZURE_OPENAI_DEPLOYMENT_CHAT", "gpt-4.1"),
                deployment_chat_mini: get_env_or_default(
                    "AZURE_OPENAI_DEPLOYMENT_CHAT_MINI",
                    "gpt-4.1-mini",
                ),
                deployment_embedding: get_env_or_default(
                    "AZURE_OPENAI_DEPLOYMENT_EMBEDDING",
                    "text-embedding-ada-002",
                ),
                timeout: get_env_or_default("REQUEST_TIMEOUT", "60")
                    .parse()
                    .context("Invalid timeout value")?,
            },
            security: SecurityConfig {
                allowed_origins: get_env_or_default(
                    "CORS_ORIGINS",
                    "http://localhost:5173,http://localhost:3000",
                )
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            },
            logging: LoggingConfig {
                level: get_env_or_default("RUST_LOG", "info"),
                format: get_env_or_default("LOG_FORMAT", "text"),
            },
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration validity
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Port number cannot be 0");
        }

        if !self.azure.endpoint.starts_with("http") {
            anyhow::bail!("Invalid Azure OpenAI endpoint, should start with 'http'");
        }

        if self.azure.api_key.is_empty() {
            anyhow::bail!("Azure OpenAI API key cannot be empty");
        }

        if self.azure.api_key.contains(char::is_whitespace) {
            anyhow::bail!("Azure OpenAI API key cannot contain whitespace characters");
        }

        if self.azure.timeout == 0 {
            anyhow::bail!("Request timeout cannot be 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        Ok(())
    }

    /// Resolve a logical model name to an Azure deployment name
    ///
    /// Known OpenAI model names map to the configured deployments; a name
    /// that already equals one of the deployments passes through unchanged.
    pub fn deployment_for(&self, model_name: &str) -> Option<String> {
        let azure = &self.azure;
        match model_name {
            "gpt-4o" | "gpt-4" => Some(azure.deployment_chat.clone()),
            "gpt-4o-mini" => Some(azure.deployment_chat_mini.clone()),
            "text-embedding-ada-002" | "text-embedding-3-small" => {
                Some(azure.deployment_embedding.clone())
            }
            name if name == azure.deployment_chat
                || name == azure.deployment_chat_mini
                || name == azure.deployment_embedding =>
            {
                Some(name.to_string())
            }
            _ => None,
        }
    }

    /// Log current configuration (without sensitive data)
    pub fn log_configuration(&self) {
        info!("Azure OpenAI configuration:");
        info!("  Endpoint: {}", self.azure.endpoint);
        info!("  Chat API version: {}", self.azure.chat_api_version);
        info!("  Embedding API version: {}", self.azure.embedding_api_version);
        info!("  Chat deployment: {}", self.azure.deployment_chat);
        info!("  Chat mini deployment: {}", self.azure.deployment_chat_mini);
        info!("  Embedding deployment: {}", self.azure.deployment_embedding);
    }
}

/// Get a required environment variable
fn get_required_env(key: &str) -> Result<String> {
    let value =
        env::var(key).with_context(|| format!("Missing required environment variable: {}", key))?;
    if value.is_empty() {
        anyhow::bail!("Missing required environment variable: {}", key);
    }
    Ok(value)
}

/// Get environment variable or default value
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
