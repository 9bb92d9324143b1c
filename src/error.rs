//! Testforge error types

use std::time::Duration;

/// Testforge error types
#[derive(Debug, thiserror::Error)]
pub enum TestforgeError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// No API key supplied via configuration or the backend's
    /// conventional environment variable.
    #[error("missing credential for {provider} (set {env_var})")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Cancellation / deadlines
    #[error("operation cancelled")]
    Cancelled,

    /// A single provider call exceeded the request deadline. Treated as
    /// a skipped definition, never a file-level failure.
    #[error("request timed out")]
    Timeout,

    // Generation errors
    /// The model response contained no usable code. Treated as a skipped
    /// definition, never a file-level failure.
    #[error("no usable code found in model response")]
    ExtractionFailed,

    /// Generated tests failed validation. Non-fatal: the written file is
    /// kept and the run continues.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// No language adapter registered for this language.
    #[error("no adapter for language: {0}")]
    AdapterMissing(String),

    #[error("parse error: {0}")]
    Parse(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty response from model")]
    EmptyResponse,

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for testforge operations
pub type Result<T> = std::result::Result<T, TestforgeError>;
