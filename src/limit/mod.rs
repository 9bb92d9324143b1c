//! Outbound request admission control.
//!
//! [`RateLimiter`] is the sole cross-worker admission point: a token
//! bucket that never allows more than the configured requests-per-minute
//! regardless of worker count. [`Batcher`] optionally groups requests
//! before they reach a provider.

mod batcher;
mod bucket;

pub use batcher::Batcher;
pub use bucket::RateLimiter;
