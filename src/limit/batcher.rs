//! Size-threshold request batching.

use std::sync::{Arc, Mutex};

use crate::providers::CompletionProvider;
use crate::types::{CompletionRequest, CompletionResponse};
use crate::Result;

const DEFAULT_BATCH_SIZE: usize = 5;

/// Accumulates completion requests and sends them through
/// [`CompletionProvider::batch_complete`] once the batch size is
/// reached, or on an explicit [`flush`](Batcher::flush).
///
/// There is no time-based flush: a caller that queues fewer requests
/// than one full batch must call `flush` itself, otherwise those
/// requests stay queued indefinitely. [`pending`](Batcher::pending)
/// exposes the queue depth for exactly that check.
pub struct Batcher {
    provider: Arc<dyn CompletionProvider>,
    batch_size: usize,
    pending: Mutex<Vec<CompletionRequest>>,
}

impl Batcher {
    /// Create a batcher flushing every `batch_size` requests (0 selects
    /// the default of 5).
    pub fn new(provider: Arc<dyn CompletionProvider>, batch_size: usize) -> Self {
        let batch_size = if batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            batch_size
        };
        Self {
            provider,
            batch_size,
            pending: Mutex::new(Vec::with_capacity(batch_size)),
        }
    }

    /// Queue one request.
    ///
    /// When the queue reaches the batch size this triggers a flush and
    /// returns the batch responses, positionally aligned with the
    /// flushed requests; otherwise returns `None`.
    pub async fn add(
        &self,
        req: CompletionRequest,
    ) -> Option<Vec<Result<CompletionResponse>>> {
        let should_flush = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.push(req);
            pending.len() >= self.batch_size
        };

        if should_flush {
            Some(self.flush().await)
        } else {
            None
        }
    }

    /// Send all queued requests concurrently through the provider.
    ///
    /// Returns one result per request in queue order; failed
    /// sub-requests do not discard the successes.
    pub async fn flush(&self) -> Vec<Result<CompletionResponse>> {
        let batch = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };

        if batch.is_empty() {
            return Vec::new();
        }

        self.provider.batch_complete(&batch).await
    }

    /// Requests currently queued.
    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}
