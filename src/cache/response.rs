//! Content-addressed store for completion responses.
//!
//! The cache is keyed by the meaning-determining inputs of a request —
//! prompt, system role, and backend+model identifier — so two workers
//! building the same prompt for the same backend share one network call.
//!
//! # Architecture
//!
//! The cache sits in the [`Engine`](crate::engine::Engine), in front of
//! the provider call. A hit bypasses the rate limiter and the network
//! entirely. Eviction is recency-ordered (moka) behind the plain
//! get/set contract, which keeps memory bounded without the caller
//! caring about the policy.
//!
//! # Copy safety
//!
//! `get` returns an independent clone with `cached = true`; mutating a
//! returned response never corrupts the stored entry.

use std::sync::atomic::{AtomicU64, Ordering};

use moka::sync::Cache;
use sha2::{Digest, Sha256};

use crate::telemetry;
use crate::types::CompletionResponse;

/// Reserved field separator for key derivation. Cannot appear in
/// legitimate prompt/role/model values produced by the engine.
const KEY_SEPARATOR: u8 = 0x1F;

const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Derive a cache key from the meaning-determining request inputs.
///
/// Pure and deterministic: SHA-256 over the three fields joined by a
/// reserved separator byte, hex-encoded. Identical key ⇒ semantically
/// identical request ⇒ safe to reuse the response.
pub fn generate_key(prompt: &str, system_role: &str, backend_model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update([KEY_SEPARATOR]);
    hasher.update(system_role.as_bytes());
    hasher.update([KEY_SEPARATOR]);
    hasher.update(backend_model.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub size: u64,
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses), 0.0 when nothing was looked up.
    pub hit_rate: f64,
}

/// In-memory response cache, safe for concurrent use by all workers.
pub struct ResponseCache {
    inner: Cache<String, CompletionResponse>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    /// Create a cache bounded to `max_entries` (0 selects the default
    /// of 10,000).
    pub fn new(max_entries: u64) -> Self {
        let capacity = if max_entries == 0 {
            DEFAULT_MAX_ENTRIES
        } else {
            max_entries
        };
        Self {
            inner: Cache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a response. Never touches the network.
    ///
    /// On a hit, returns an independent copy with `cached` set.
    pub fn get(&self, key: &str) -> Option<CompletionResponse> {
        match self.inner.get(key) {
            Some(mut response) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                response.cached = true;
                Some(response)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store a response. At capacity, a least-recently-used entry is
    /// evicted.
    pub fn set(&self, key: impl Into<String>, response: CompletionResponse) {
        self.inner.insert(key.into(), response);
    }

    /// Current statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        // Flush pending maintenance so the size is accurate.
        self.inner.run_pending_tasks();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        CacheStats {
            size: self.inner.entry_count(),
            hits,
            misses,
            hit_rate,
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}
