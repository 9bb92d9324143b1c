//! Per-provider usage accounting.

use serde::{Deserialize, Serialize};

/// Running usage counters for one provider instance.
///
/// Mutated only by the owning provider under its internal lock; read via
/// [`CompletionProvider::usage`](crate::providers::CompletionProvider::usage),
/// which returns a snapshot, never the live struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Total completion requests issued.
    pub total_requests: u64,
    /// Total input tokens across all requests.
    pub total_tokens_in: u64,
    /// Total output tokens across all requests.
    pub total_tokens_out: u64,
    /// Estimated cost in USD, input and output priced independently.
    pub estimated_cost_usd: f64,
}

impl UsageMetrics {
    /// Fold one completed request into the counters.
    pub(crate) fn record(&mut self, tokens_in: u32, tokens_out: u32, cost_usd: f64) {
        self.total_requests += 1;
        self.total_tokens_in += u64::from(tokens_in);
        self.total_tokens_out += u64::from(tokens_out);
        self.estimated_cost_usd += cost_usd;
    }
}
