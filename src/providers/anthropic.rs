//! Anthropic Messages API client.
//!
//! See: <https://docs.anthropic.com/en/api/messages>

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, ProviderConfig, check_status, record_failure, record_usage};
use crate::types::{CompletionRequest, CompletionResponse, UsageMetrics};
use crate::{Result, TestforgeError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    base_url: String,
    http: Client,
    usage: Mutex<UsageMetrics>,
}

impl AnthropicClient {
    /// Configure a client, resolving the credential from the config or
    /// `ANTHROPIC_API_KEY` and applying backend defaults.
    pub fn configure(config: ProviderConfig) -> Result<Self> {
        let api_key = super::resolve_api_key(config.api_key, "anthropic", &["ANTHROPIC_API_KEY"])?;
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| TestforgeError::Http(e.to_string()))?;

        Ok(Self {
            api_key,
            model: config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: if config.max_tokens == 0 {
                DEFAULT_MAX_TOKENS
            } else {
                config.max_tokens
            },
            temperature: config.temperature,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http,
            usage: Mutex::new(UsageMetrics::default()),
        })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
        let start = Instant::now();

        let max_tokens = if req.max_tokens == 0 {
            self.max_tokens
        } else {
            req.max_tokens
        };
        let temperature = if req.temperature == 0.0 {
            self.temperature
        } else {
            req.temperature
        };

        let api_req = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![WireMessage {
                role: "user",
                content: &req.prompt,
            }],
            system: req.system_role.as_deref(),
            temperature,
        };

        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&api_req)
            .send()
            .await
            .map_err(|e| {
                record_failure("anthropic", start);
                TestforgeError::Http(e.to_string())
            })?;

        let response = check_status("anthropic", response)
            .await
            .inspect_err(|_| record_failure("anthropic", start))?;

        let api_resp: MessagesResponse = response.json().await.map_err(|e| {
            record_failure("anthropic", start);
            TestforgeError::Http(e.to_string())
        })?;

        let content: String = api_resp
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        record_usage(
            "anthropic",
            &self.model,
            &self.usage,
            api_resp.usage.input_tokens,
            api_resp.usage.output_tokens,
            start,
        );

        Ok(CompletionResponse {
            content,
            tokens_input: api_resp.usage.input_tokens,
            tokens_output: api_resp.usage.output_tokens,
            cached: false,
            model: api_resp.model,
            finish_reason: api_resp.stop_reason,
        })
    }

    fn usage(&self) -> UsageMetrics {
        self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "temperature_unset")]
    temperature: f32,
}

fn temperature_unset(t: &f32) -> bool {
    *t == 0.0
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: WireUsage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}
