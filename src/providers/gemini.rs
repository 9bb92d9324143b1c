//! Google Gemini generateContent client.
//!
//! See: <https://ai.google.dev/api/generate-content>

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{CompletionProvider, ProviderConfig, check_status, record_failure, record_usage};
use crate::types::{CompletionRequest, CompletionResponse, UsageMetrics};
use crate::{Result, TestforgeError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    base_url: String,
    http: Client,
    usage: Mutex<UsageMetrics>,
}

impl GeminiClient {
    /// Configure a client, resolving the credential from the config or
    /// `GEMINI_API_KEY` (with `GOOGLE_API_KEY` as a fallback) and
    /// applying backend defaults.
    pub fn configure(config: ProviderConfig) -> Result<Self> {
        let api_key = super::resolve_api_key(
            config.api_key,
            "gemini",
            &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        )?;
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
impl CompletionProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
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

        let api_req = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: &req.prompt }],
            }],
            system_instruction: req.system_role.as_deref().map(|role| Content {
                role: None,
                parts: vec![Part { text: role }],
            }),
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            },
        };

        // Gemini authenticates via query parameter, not a header.
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self.http.post(url).json(&api_req).send().await.map_err(|e| {
            record_failure("gemini", start);
            TestforgeError::Http(e.to_string())
        })?;

        let response = check_status("gemini", response)
            .await
            .inspect_err(|_| record_failure("gemini", start))?;

        let api_resp: GenerateContentResponse = response.json().await.map_err(|e| {
            record_failure("gemini", start);
            TestforgeError::Http(e.to_string())
        })?;

        let (content, finish_reason) = match api_resp.candidates.into_iter().next() {
            Some(candidate) => (
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>(),
                candidate.finish_reason,
            ),
            None => (String::new(), None),
        };

        record_usage(
            "gemini",
            &self.model,
            &self.usage,
            api_resp.usage_metadata.prompt_token_count,
            api_resp.usage_metadata.candidates_token_count,
            start,
        );

        Ok(CompletionResponse {
            content,
            tokens_input: api_resp.usage_metadata.prompt_token_count,
            tokens_output: api_resp.usage_metadata.candidates_token_count,
            cached: false,
            model: self.model.clone(),
            finish_reason,
        })
    }

    fn usage(&self) -> UsageMetrics {
        self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: UsageMetadata,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    // Absent on SAFETY-blocked candidates.
    #[serde(default)]
    content: ResponseContent,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}
