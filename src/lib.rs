//! Testforge - Generation orchestration engine for LLM-backed test generation
//!
//! This crate turns extracted source-code definitions into generated
//! tests by routing prompts through one of several interchangeable
//! text-generation backends, while controlling cost, latency, and
//! throughput: identical requests are deduplicated through a semantic
//! response cache, outbound calls share a token-bucket rate limit, and
//! files fan out across a bounded worker pool.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use testforge::{
//!     AdapterRegistry, Engine, EngineConfig, ProviderConfig, WorkerPool, providers, scanner,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> testforge::Result<()> {
//!     let provider = providers::from_name("anthropic", ProviderConfig::new())?;
//!     let engine = Arc::new(Engine::new(
//!         provider,
//!         AdapterRegistry::with_defaults(),
//!         EngineConfig::default(),
//!         0, // cache entries (default)
//!         60, // requests per minute
//!         CancellationToken::new(),
//!     ));
//!
//!     let files = scanner::scan(std::path::Path::new("./src"))?;
//!     let results = WorkerPool::new(engine, 3).process_files(files).await;
//!     for result in &results {
//!         println!("{:?}: {:?}", result.source, result.error);
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod analyze;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod limit;
pub mod providers;
pub mod report;
pub mod scanner;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use error::{Result, TestforgeError};

pub use adapters::{AdapterRegistry, LanguageAdapter};
pub use cache::{CacheStats, ResponseCache};
pub use config::Config;
pub use engine::{Engine, EngineConfig, WorkerPool};
pub use limit::{Batcher, RateLimiter};
pub use providers::{CompletionProvider, ProviderConfig};
pub use report::RunReport;

// Re-export core data types
pub use types::{
    Ast, CompletionRequest, CompletionResponse, Definition, GenerationResult, Language, Parameter,
    SourceFile, TestType, UsageMetrics,
};
