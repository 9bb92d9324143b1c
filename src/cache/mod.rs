//! Semantic response caching.

mod response;

pub use response::{CacheStats, ResponseCache, generate_key};
