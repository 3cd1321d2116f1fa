//! AI service tests against a stub provider
//!
//! Exercises the operation functions end to end over HTTP using httpmock

use aibackend::config::settings::*;
use aibackend::models::provider::ChatMessage;
use aibackend::services::{AiService, CompletionRequest, ProviderClient, RetryPolicy};
use aibackend::utils::error::{AppError, FailureKind};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

fn stub_settings(endpoint: &str) -> Settings {
    Settings {
        server: ServerConfig {
            host: "localhost".to_string(),
            port: 8000,
            environment: "development".to_string(),
        },
        azure: AzureConfig {
            endpoint: endpoint.to_string(),
            api_key: "test-key".to_string(),
            chat_api_version: "2024-12-01-preview".to_string(),
            embedding_api_version: "2023-05-15".to_string(),
            deployment_chat: "gpt-4.1".to_string(),
            deployment_chat_mini: "gpt-4.1-mini".to_string(),
            deployment_embedding: "text-embedding-ada-002".to_string(),
            timeout: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: "text".to_string(),
        },
    }
}

fn stub_service(endpoint: &str) -> AiService {
    let settings = stub_settings(endpoint);
    let client = ProviderClient::new(&settings).expect("Failed to create client");
    let policy = RetryPolicy::new(3, Duration::from_millis(10), 2.0);
    AiService::with_policy(settings, client, policy)
}

fn chat_response_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "model": "gpt-4.1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 5, "total_tokens": 10}
    })
}

#[tokio::test]
async fn test_embed_batch_preserves_input_order() {
    let server = MockServer::start_async().await;

    // Vectors arrive tagged by index, deliberately out of order
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/text-embedding-ada-002/embeddings")
                .query_param("api-version", "2023-05-15");
            then.status(200).json_body(json!({
                "data": [
                    {"index": 2, "embedding": [3.0]},
                    {"index": 0, "embedding": [1.0]},
                    {"index": 1, "embedding": [2.0]}
                ],
                "model": "text-embedding-ada-002"
            }));
        })
        .await;

    let service = stub_service(&server.base_url());
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = service.embed_batch(&texts).await.unwrap();

    assert_eq!(vectors.len(), 3);
    assert_eq!(vectors[0], vec![1.0]);
    assert_eq!(vectors[1], vec![2.0]);
    assert_eq!(vectors[2], vec![3.0]);
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_embed_single_text() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/text-embedding-ada-002/embeddings");
            then.status(200).json_body(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2, 0.3]}],
                "model": "text-embedding-ada-002"
            }));
        })
        .await;

    let service = stub_service(&server.base_url());
    let vector = service.embed("hello").await.unwrap();
    assert_eq!(vector, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn test_complete_returns_first_choice_content() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1/chat/completions")
                .query_param("api-version", "2024-12-01-preview")
                .header("api-key", "test-key");
            then.status(200).json_body(chat_response_body("Hi there!"));
        })
        .await;

    let service = stub_service(&server.base_url());
    let request = CompletionRequest::new(vec![ChatMessage::user("Hello")]);
    let content = service.complete(&request).await.unwrap();

    assert_eq!(content, "Hi there!");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_complete_normalizes_missing_content_to_empty() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1/chat/completions");
            then.status(200).json_body(json!({
                "id": "chatcmpl-test",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant"},
                    "finish_reason": "content_filter"
                }]
            }));
        })
        .await;

    let service = stub_service(&server.base_url());
    let request = CompletionRequest::new(vec![ChatMessage::user("Hello")]);
    let content = service.complete(&request).await.unwrap();

    assert_eq!(content, "");
}

#[tokio::test]
async fn test_complete_routes_model_override_to_mapped_deployment() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1-mini/chat/completions");
            then.status(200).json_body(chat_response_body("mini says hi"));
        })
        .await;

    let service = stub_service(&server.base_url());
    let request =
        CompletionRequest::new(vec![ChatMessage::user("Hello")]).with_model("gpt-4o-mini");
    let content = service.complete(&request).await.unwrap();

    assert_eq!(content, "mini says hi");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_complete_json_parses_structured_output() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1/chat/completions")
                .json_body_partial(r#"{"response_format": {"type": "json_object"}}"#);
            then.status(200)
                .json_body(chat_response_body("{\"topics\": [\"x\"]}"));
        })
        .await;

    let service = stub_service(&server.base_url());
    let request = CompletionRequest::json(vec![ChatMessage::user("Analyze")]);
    let value = service.complete_json(&request).await.unwrap();

    assert_eq!(value, json!({"topics": ["x"]}));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_complete_json_malformed_output_carries_raw_text() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1/chat/completions");
            then.status(200).json_body(chat_response_body("{bad json"));
        })
        .await;

    let service = stub_service(&server.base_url());
    let request = CompletionRequest::json(vec![ChatMessage::user("Analyze")]);
    let error = service.complete_json(&request).await.unwrap_err();

    match error {
        AppError::Parse { raw, .. } => assert_eq!(raw, "{bad json"),
        other => panic!("Expected parse error, got {:?}", other),
    }
    // Malformed output is not retried
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1/chat/completions");
            then.status(404).json_body(json!({
                "error": {"message": "The API deployment for this resource does not exist.", "code": "DeploymentNotFound"}
            }));
        })
        .await;

    let service = stub_service(&server.base_url());
    let request = CompletionRequest::new(vec![ChatMessage::user("Hello")]);
    let error = service.complete(&request).await.unwrap_err();

    assert_eq!(error.failure_kind(), Some(FailureKind::ClientError(404)));
    // The provider's own message survives classification
    assert!(error.to_string().contains("does not exist"));
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_server_error_is_retried_until_exhaustion() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1/chat/completions");
            then.status(503).body("upstream overloaded");
        })
        .await;

    let service = stub_service(&server.base_url());
    let request = CompletionRequest::new(vec![ChatMessage::user("Hello")]);
    let error = service.complete(&request).await.unwrap_err();

    assert_eq!(error.failure_kind(), Some(FailureKind::ServerError(503)));
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/text-embedding-ada-002/embeddings");
            then.status(429)
                .json_body(json!({"error": {"message": "Requests are being throttled"}}));
        })
        .await;

    let service = stub_service(&server.base_url());
    let error = service.embed("hello").await.unwrap_err();

    assert_eq!(error.failure_kind(), Some(FailureKind::RateLimited));
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_deterministic_completion_is_idempotent() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1/chat/completions");
            then.status(200)
                .json_body(chat_response_body("The answer is 42."));
        })
        .await;

    let service = stub_service(&server.base_url());
    let request =
        CompletionRequest::new(vec![ChatMessage::user("Question")]).with_temperature(0.0);

    let first = service.complete(&request).await.unwrap();
    let second = service.complete(&request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_quick_analysis_uses_mini_deployment() {
    let server = MockServer::start_async().await;

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1-mini/chat/completions")
                .json_body_partial(
                    r#"{"messages": [
                        {"role": "system", "content": "Summarize this"},
                        {"role": "user", "content": "A long document"}
                    ]}"#,
                );
            then.status(200).json_body(chat_response_body("A summary."));
        })
        .await;

    let service = stub_service(&server.base_url());
    let result = service
        .quick_analysis("A long document", "Summarize this", None)
        .await
        .unwrap();

    assert_eq!(result, "A summary.");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_health_probe_healthy() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1-mini/chat/completions");
            then.status(200).json_body(chat_response_body("Hello!"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/text-embedding-ada-002/embeddings");
            then.status(200).json_body(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2]}],
                "model": "text-embedding-ada-002"
            }));
        })
        .await;

    let service = stub_service(&server.base_url());
    let status = service.client().validate_connection().await.unwrap();

    assert_eq!(status.status, "healthy");
    assert_eq!(status.chat_completion, "ok");
    assert_eq!(status.embeddings, "ok");
    assert_eq!(status.endpoint, server.base_url());
}

#[tokio::test]
async fn test_health_probe_degraded_on_empty_chat_content() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1-mini/chat/completions");
            then.status(200).json_body(chat_response_body(""));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/text-embedding-ada-002/embeddings");
            then.status(200).json_body(json!({
                "data": [{"index": 0, "embedding": [0.1, 0.2]}],
                "model": "text-embedding-ada-002"
            }));
        })
        .await;

    let service = stub_service(&server.base_url());
    let status = service.client().validate_connection().await.unwrap();

    assert_eq!(status.status, "degraded");
    assert_eq!(status.chat_completion, "failed");
    assert_eq!(status.embeddings, "ok");
}

#[tokio::test]
async fn test_health_probe_does_not_retry() {
    let server = MockServer::start_async().await;

    let chat_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/gpt-4.1-mini/chat/completions");
            then.status(500).body("boom");
        })
        .await;
    let embed_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/deployments/text-embedding-ada-002/embeddings");
            then.status(200).json_body(json!({
                "data": [{"index": 0, "embedding": [0.1]}],
                "model": "text-embedding-ada-002"
            }));
        })
        .await;

    let service = stub_service(&server.base_url());
    let status = service.client().validate_connection().await.unwrap();

    assert_eq!(status.status, "degraded");
    assert_eq!(status.chat_completion, "failed");
    // Probes fail fast: one attempt per sub-check
    chat_mock.assert_hits_async(1).await;
    embed_mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_health_probe_unreachable_provider() {
    // Nothing listens on this port
    let service = stub_service("http://127.0.0.1:1");
    let error = service.client().validate_connection().await.unwrap_err();

    assert!(matches!(error, AppError::Unreachable(_)));
}
