//! OpenAI chat-completions client.
//!
//! See: <https://platform.openai.com/docs/api-reference/chat>

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use super::openai_compat::{ChatRequest, ChatResponse};
use super::{CompletionProvider, ProviderConfig, check_status, record_failure, record_usage};
use crate::types::{CompletionRequest, CompletionResponse, UsageMetrics};
use crate::{Result, TestforgeError};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Client for the OpenAI chat-completions API.
pub struct OpenAiClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    base_url: String,
    http: Client,
    usage: Mutex<UsageMetrics>,
}

impl OpenAiClient {
    /// Configure a client, resolving the credential from the config or
    /// `OPENAI_API_KEY` and applying backend defaults.
    pub fn configure(config: ProviderConfig) -> Result<Self> {
        let api_key = super::resolve_api_key(config.api_key, "openai", &["OPENAI_API_KEY"])?;
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
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
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

        let api_req = ChatRequest::from_completion(&self.model, req, max_tokens, temperature);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&api_req)
            .send()
            .await
            .map_err(|e| {
                record_failure("openai", start);
                TestforgeError::Http(e.to_string())
            })?;

        let response = check_status("openai", response)
            .await
            .inspect_err(|_| record_failure("openai", start))?;

        let api_resp: ChatResponse = response.json().await.map_err(|e| {
            record_failure("openai", start);
            TestforgeError::Http(e.to_string())
        })?;

        let (content, finish_reason) = match api_resp.choices.into_iter().next() {
            Some(choice) => (choice.message.content, choice.finish_reason),
            None => (String::new(), None),
        };

        record_usage(
            "openai",
            &self.model,
            &self.usage,
            api_resp.usage.prompt_tokens,
            api_resp.usage.completion_tokens,
            start,
        );

        Ok(CompletionResponse {
            content,
            tokens_input: api_resp.usage.prompt_tokens,
            tokens_output: api_resp.usage.completion_tokens,
            cached: false,
            model: api_resp.model,
            finish_reason,
        })
    }

    fn usage(&self) -> UsageMetrics {
        self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
