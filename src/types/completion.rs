//! Completion request/response value objects.

use serde::{Deserialize, Serialize};

/// A single completion request.
///
/// Value object: created per provider call, never mutated after creation.
///
/// ```rust
/// # use testforge::CompletionRequest;
/// let req = CompletionRequest::new("Generate tests for add(a, b)")
///     .system_role("Output only code.")
///     .max_tokens(2000)
///     .temperature(0.3);
/// assert_eq!(req.max_tokens, 2000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The user prompt.
    pub prompt: String,
    /// Optional system role prepended to the conversation.
    pub system_role: Option<String>,
    /// Maximum output tokens. 0 means "use the provider default".
    pub max_tokens: u32,
    /// Sampling temperature. 0.0 means "use the provider default".
    pub temperature: f32,
    /// Optional determinism seed (honoured by backends that support it).
    pub seed: Option<u64>,
}

impl CompletionRequest {
    /// Create a request with the given prompt and defaults elsewhere.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_role: None,
            max_tokens: 0,
            temperature: 0.0,
            seed: None,
        }
    }

    /// Set the system role.
    pub fn system_role(mut self, role: impl Into<String>) -> Self {
        self.system_role = Some(role.into());
        self
    }

    /// Set the maximum output tokens.
    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    /// Set the determinism seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A completion response, either fresh from a provider or reconstructed
/// from the response cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated text.
    pub content: String,
    /// Input token count reported by the backend.
    pub tokens_input: u32,
    /// Output token count reported by the backend.
    pub tokens_output: u32,
    /// True when this response was served from the cache.
    pub cached: bool,
    /// Backend model identifier that produced this response.
    pub model: String,
    /// Backend stop reason, verbatim.
    pub finish_reason: Option<String>,
}
