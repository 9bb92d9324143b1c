//! The completion provider contract.

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::types::{CompletionRequest, CompletionResponse, UsageMetrics};
use crate::Result;

/// Configuration shared by all provider clients.
///
/// Unset fields fall back to per-backend defaults at configure time: the
/// conventional credential environment variable, the backend's default
/// model and token limit, and the public base URL.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Explicit API key. When `None`, the backend's environment variable
    /// is consulted; if that is also absent, configuration fails with
    /// [`MissingCredential`](crate::TestforgeError::MissingCredential).
    pub api_key: Option<String>,
    /// Model identifier. `None` selects the backend default.
    pub model: Option<String>,
    /// Default max output tokens when a request leaves it unset (0).
    pub max_tokens: u32,
    /// Default sampling temperature when a request leaves it unset (0.0).
    pub temperature: f32,
    /// Custom endpoint, mainly for tests against a local mock server.
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

/// A text-generation backend.
///
/// Implementations issue one network call per [`complete`] invocation and
/// mutate nothing but their own usage counters. All methods are safe for
/// concurrent use from multiple workers.
///
/// [`complete`]: CompletionProvider::complete
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Backend name, e.g. `"anthropic"`.
    fn name(&self) -> &'static str;

    /// Configured model identifier.
    fn model(&self) -> &str;

    /// Issue one completion request.
    ///
    /// HTTP 429 maps to [`RateLimited`](crate::TestforgeError::RateLimited)
    /// so callers can distinguish it from generic failures; transport
    /// failures are wrapped in [`Http`](crate::TestforgeError::Http).
    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse>;

    /// Issue several requests concurrently, one network call each.
    ///
    /// Results are positionally aligned with `reqs`; a failing
    /// sub-request does not discard the others, so callers can act on
    /// partial success.
    async fn batch_complete(&self, reqs: &[CompletionRequest]) -> Vec<Result<CompletionResponse>> {
        join_all(reqs.iter().map(|req| self.complete(req))).await
    }

    /// Approximate token count, used only for cost estimation.
    ///
    /// A character-count heuristic; not required to match the backend's
    /// tokenizer.
    fn count_tokens(&self, text: &str) -> usize {
        text.len().div_ceil(4)
    }

    /// Immutable snapshot of this client's usage counters.
    fn usage(&self) -> UsageMetrics;
}
