//! Completion provider clients.
//!
//! One client per text-generation backend, all implementing
//! [`CompletionProvider`]. Clients normalise request/response shape, map
//! HTTP failures onto the crate error taxonomy, and account usage/cost
//! under their own lock. Side effects are strictly network I/O plus the
//! client's own usage counters.

mod pricing;
mod traits;

#[cfg(feature = "anthropic")]
mod anthropic;
#[cfg(feature = "gemini")]
mod gemini;
#[cfg(feature = "groq")]
mod groq;
#[cfg(feature = "openai")]
mod openai;
#[cfg(any(feature = "openai", feature = "groq"))]
mod openai_compat;

pub use pricing::estimate_cost;
pub use traits::{CompletionProvider, ProviderConfig};

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicClient;
#[cfg(feature = "gemini")]
pub use gemini::GeminiClient;
#[cfg(feature = "groq")]
pub use groq::GroqClient;
#[cfg(feature = "openai")]
pub use openai::OpenAiClient;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::types::UsageMetrics;
use crate::{Result, TestforgeError, telemetry};

/// Construct a configured provider by backend name.
///
/// Accepted names are the enabled backend features: `anthropic`,
/// `openai`, `gemini`, `groq`.
pub fn from_name(name: &str, config: ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    match name.to_ascii_lowercase().as_str() {
        #[cfg(feature = "anthropic")]
        "anthropic" => Ok(Arc::new(AnthropicClient::configure(config)?)),
        #[cfg(feature = "openai")]
        "openai" => Ok(Arc::new(OpenAiClient::configure(config)?)),
        #[cfg(feature = "gemini")]
        "gemini" => Ok(Arc::new(GeminiClient::configure(config)?)),
        #[cfg(feature = "groq")]
        "groq" => Ok(Arc::new(GroqClient::configure(config)?)),
        other => Err(TestforgeError::Configuration(format!(
            "unknown provider: {other}"
        ))),
    }
}

/// Map non-success HTTP statuses onto the error taxonomy.
///
/// 429 is distinguished (with a parsed `retry-after` when present) so
/// callers can decide whether to retry; the engine itself surfaces it as
/// a per-definition skip.
pub(crate) async fn check_status(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 | 403 => Err(TestforgeError::AuthenticationFailed),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(std::time::Duration::from_secs);
            Err(TestforgeError::RateLimited { retry_after })
        }
        code => {
            let message = response.text().await.unwrap_or_default();
            Err(TestforgeError::Api {
                status: code,
                message: format!("{provider} API error: {message}"),
            })
        }
    }
}

/// Fold one completed request into a client's usage counters and emit
/// the corresponding telemetry.
pub(crate) fn record_usage(
    provider: &'static str,
    model: &str,
    usage: &Mutex<UsageMetrics>,
    tokens_in: u32,
    tokens_out: u32,
    start: Instant,
) {
    let cost = pricing::estimate_cost(provider, model, tokens_in, tokens_out);
    {
        // Poisoning only happens if a panic occurred mid-update; the
        // counters are plain integers, so continue with the inner value.
        let mut guard = usage.lock().unwrap_or_else(|e| e.into_inner());
        guard.record(tokens_in, tokens_out, cost);
    }

    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "provider" => provider,
        "status" => "ok",
    )
    .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "provider" => provider)
        .record(start.elapsed().as_secs_f64());
    metrics::counter!(telemetry::TOKENS_TOTAL,
        "provider" => provider,
        "direction" => "input",
    )
    .increment(u64::from(tokens_in));
    metrics::counter!(telemetry::TOKENS_TOTAL,
        "provider" => provider,
        "direction" => "output",
    )
    .increment(u64::from(tokens_out));
}

/// Record a failed request in telemetry.
pub(crate) fn record_failure(provider: &'static str, start: Instant) {
    metrics::counter!(telemetry::REQUESTS_TOTAL,
        "provider" => provider,
        "status" => "error",
    )
    .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "provider" => provider)
        .record(start.elapsed().as_secs_f64());
}

/// Resolve an API key from explicit config or the backend's conventional
/// environment variable.
pub(crate) fn resolve_api_key(
    explicit: Option<String>,
    provider: &'static str,
    env_vars: &[&'static str],
) -> Result<String> {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return Ok(key);
    }
    for var in env_vars {
        if let Ok(key) = std::env::var(var)
            && !key.is_empty()
        {
            return Ok(key);
        }
    }
    Err(TestforgeError::MissingCredential {
        provider,
        env_var: env_vars[0],
    })
}
