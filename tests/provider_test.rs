//! Provider client HTTP behaviour against a mock server.
//!
//! Covers status mapping (429 with retry-after, auth failures, generic
//! API errors), usage/cost accounting, and batch partial success.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use testforge::providers::{AnthropicClient, GeminiClient, OpenAiClient};
use testforge::{CompletionProvider, CompletionRequest, ProviderConfig, TestforgeError};

fn anthropic_body(text: &str, input_tokens: u32, output_tokens: u32) -> serde_json::Value {
    json!({
        "content": [{"type": "text", "text": text}],
        "model": "claude-3-5-sonnet-20241022",
        "stop_reason": "end_turn",
        "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens}
    })
}

fn openai_body(text: &str, prompt_tokens: u32, completion_tokens: u32) -> serde_json::Value {
    json!({
        "model": "gpt-4-turbo-preview",
        "choices": [{
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": prompt_tokens, "completion_tokens": completion_tokens}
    })
}

async fn anthropic_client(server: &MockServer) -> AnthropicClient {
    AnthropicClient::configure(
        ProviderConfig::new()
            .api_key("test-key")
            .base_url(server.uri()),
    )
    .expect("configure should succeed with explicit key")
}

async fn openai_client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::configure(
        ProviderConfig::new()
            .api_key("test-key")
            .base_url(server.uri()),
    )
    .expect("configure should succeed with explicit key")
}

#[tokio::test]
async fn anthropic_success_maps_response_and_records_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_body("tests!", 1000, 500)))
        .expect(1)
        .mount(&server)
        .await;

    let client = anthropic_client(&server).await;
    let req = CompletionRequest::new("generate tests").system_role("only code");
    let resp = client.complete(&req).await.expect("request should succeed");

    assert_eq!(resp.content, "tests!");
    assert_eq!(resp.tokens_input, 1000);
    assert_eq!(resp.tokens_output, 500);
    assert!(!resp.cached);
    assert_eq!(resp.finish_reason.as_deref(), Some("end_turn"));

    // 1000 in at $3/M plus 500 out at $15/M.
    let usage = client.usage();
    assert_eq!(usage.total_requests, 1);
    assert_eq!(usage.total_tokens_in, 1000);
    assert_eq!(usage.total_tokens_out, 500);
    assert!((usage.estimated_cost_usd - 0.0105).abs() < 1e-9);
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limited_with_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let client = anthropic_client(&server).await;
    let err = client
        .complete(&CompletionRequest::new("x"))
        .await
        .expect_err("429 should fail");

    match err {
        TestforgeError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = openai_client(&server).await;
    let err = client
        .complete(&CompletionRequest::new("x"))
        .await
        .expect_err("401 should fail");
    assert!(matches!(err, TestforgeError::AuthenticationFailed));
}

#[tokio::test]
async fn server_error_maps_to_api_error_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = anthropic_client(&server).await;
    let err = client
        .complete(&CompletionRequest::new("x"))
        .await
        .expect_err("500 should fail");

    match err {
        TestforgeError::Api { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("overloaded"));
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_credential_fails_configure() {
    // Explicit empty key and no env override for this made-up name.
    let result = AnthropicClient::configure(
        ProviderConfig::new().api_key("").base_url("http://localhost"),
    );
    match result {
        Err(TestforgeError::MissingCredential { provider, env_var }) => {
            assert_eq!(provider, "anthropic");
            assert_eq!(env_var, "ANTHROPIC_API_KEY");
        }
        Ok(_) => {
            // ANTHROPIC_API_KEY present in the environment; the fallback
            // is allowed to succeed.
        }
        Err(other) => panic!("expected MissingCredential, got {other:?}"),
    }
}

#[tokio::test]
async fn batch_preserves_order_and_partial_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("boom"))
        .respond_with(ResponseTemplate::new(500).set_body_string("kaboom"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("ok", 10, 5)))
        .mount(&server)
        .await;

    let client = openai_client(&server).await;
    let reqs = vec![
        CompletionRequest::new("first"),
        CompletionRequest::new("boom"),
        CompletionRequest::new("third"),
    ];
    let results = client.batch_complete(&reqs).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().content, "ok");
    assert!(matches!(
        results[1],
        Err(TestforgeError::Api { status: 500, .. })
    ));
    assert_eq!(results[2].as_ref().unwrap().content, "ok");

    // Only the two successes are accounted.
    let usage = client.usage();
    assert_eq!(usage.total_requests, 2);
    assert_eq!(usage.total_tokens_in, 20);
}

#[tokio::test]
async fn system_role_is_sent_as_system_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("\"role\":\"system\""))
        .and(body_string_contains("only code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_body("ok", 1, 1)))
        .expect(1)
        .mount(&server)
        .await;

    let client = openai_client(&server).await;
    let req = CompletionRequest::new("prompt").system_role("only code");
    client.complete(&req).await.expect("request should succeed");
}

#[tokio::test]
async fn gemini_safety_blocked_candidate_yields_empty_content() {
    let server = MockServer::start().await;
    // A blocked candidate carries only a finishReason, no content.
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-pro:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"finishReason": "SAFETY"}],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 0}
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::configure(
        ProviderConfig::new()
            .api_key("test-key")
            .base_url(server.uri()),
    )
    .expect("configure should succeed with explicit key");

    let response = client
        .complete(&CompletionRequest::new("hello"))
        .await
        .expect("a blocked candidate is not a transport error");
    assert_eq!(response.content, "");
    assert_eq!(response.finish_reason.as_deref(), Some("SAFETY"));
}

#[test]
fn count_tokens_is_chars_over_four() {
    struct Fixed;
    #[async_trait::async_trait]
    impl CompletionProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn model(&self) -> &str {
            "fixed-1"
        }
        async fn complete(
            &self,
            _req: &CompletionRequest,
        ) -> testforge::Result<testforge::CompletionResponse> {
            Err(TestforgeError::EmptyResponse)
        }
        fn usage(&self) -> testforge::UsageMetrics {
            testforge::UsageMetrics::default()
        }
    }

    let provider = Fixed;
    assert_eq!(provider.count_tokens(""), 0);
    assert_eq!(provider.count_tokens("abcd"), 1);
    assert_eq!(provider.count_tokens("abcde"), 2);
}
