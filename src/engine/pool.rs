//! Bounded worker pool over a shared engine.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use super::Engine;
use crate::types::{GenerationResult, SourceFile};
use crate::TestforgeError;

const DEFAULT_WORKERS: usize = 3;

/// Fans a file list out over N workers sharing one [`Engine`].
///
/// Exactly one [`GenerationResult`] comes back per input file, in
/// completion order. Files without a registered adapter are answered
/// immediately and never enter the queue. After cancellation, remaining
/// files drain as cancelled results instead of being dropped.
pub struct WorkerPool {
    engine: Arc<Engine>,
    workers: usize,
}

impl WorkerPool {
    /// A pool of `workers` workers (0 selects the default of 3).
    pub fn new(engine: Arc<Engine>, workers: usize) -> Self {
        Self {
            engine,
            workers: if workers == 0 { DEFAULT_WORKERS } else { workers },
        }
    }

    /// Process every file, returning one result per input.
    pub async fn process_files(&self, files: Vec<SourceFile>) -> Vec<GenerationResult> {
        let mut results = Vec::with_capacity(files.len());
        let (file_tx, file_rx) = mpsc::channel::<SourceFile>(files.len().max(1));
        let (result_tx, mut result_rx) = mpsc::channel::<GenerationResult>(files.len().max(1));

        let mut queued = 0usize;
        for file in files {
            if self.engine.has_adapter(file.language) {
                // Queue is sized to hold every file, so this never blocks.
                if file_tx.send(file).await.is_err() {
                    break;
                }
                queued += 1;
            } else {
                results.push(GenerationResult::failed(
                    &file,
                    TestforgeError::AdapterMissing(file.language.to_string()).to_string(),
                ));
            }
        }
        drop(file_tx);

        let workers = self.workers.min(queued.max(1));
        info!(workers, files = queued, "starting worker pool");

        let file_rx = Arc::new(Mutex::new(file_rx));
        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let engine = Arc::clone(&self.engine);
            let file_rx = Arc::clone(&file_rx);
            let result_tx = result_tx.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let file = { file_rx.lock().await.recv().await };
                    let Some(file) = file else { break };

                    let result = if engine.cancel_token().is_cancelled() {
                        GenerationResult::failed(&file, TestforgeError::Cancelled.to_string())
                    } else {
                        engine.generate(&file).await
                    };
                    if result_tx.send(result).await.is_err() {
                        break;
                    }
                }
                debug!(worker = id, "worker done");
            }));
        }
        drop(result_tx);

        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }
        for handle in handles {
            // Workers never panic; a join error would mean they did.
            let _ = handle.await;
        }
        results
    }
}
