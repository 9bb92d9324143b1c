//! Telemetry metric name constants.
//!
//! Centralised metric names for testforge operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `testforge_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — backend name (e.g. "anthropic", "openai")
//! - `status` — outcome: "ok" or "error"
//! - `direction` — token direction: "input" or "output"

/// Total completion requests dispatched to providers.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "testforge_requests_total";

/// Completion request duration in seconds.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "testforge_request_duration_seconds";

/// Total tokens consumed.
///
/// Labels: `provider`, `direction` ("input" | "output").
pub const TOKENS_TOTAL: &str = "testforge_tokens_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "testforge_cache_hits_total";

/// Total response cache misses.
pub const CACHE_MISSES_TOTAL: &str = "testforge_cache_misses_total";

/// Total definitions skipped due to per-definition failures.
///
/// Labels: `reason`.
pub const DEFINITIONS_SKIPPED_TOTAL: &str = "testforge_definitions_skipped_total";
