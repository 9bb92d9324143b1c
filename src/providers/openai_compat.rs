//! Wire types for the OpenAI chat-completions format.
//!
//! Shared by the OpenAI and Groq clients; Groq exposes an
//! OpenAI-compatible endpoint.

use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "max_tokens_unset")]
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "temperature_unset")]
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn max_tokens_unset(n: &u32) -> bool {
    *n == 0
}

fn temperature_unset(t: &f32) -> bool {
    *t == 0.0
}

#[derive(Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub model: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: ResponseUsage,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize, Default)]
pub(crate) struct ResponseUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

impl<'a> ChatRequest<'a> {
    /// Assemble the message list: optional system role, then the prompt.
    pub fn from_completion(
        model: &'a str,
        req: &'a crate::types::CompletionRequest,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(role) = req.system_role.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: role,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &req.prompt,
        });

        Self {
            model,
            messages,
            max_tokens,
            temperature,
            seed: req.seed,
        }
    }
}
