//! The generation engine.
//!
//! [`Engine::generate`] drives one source file through a fixed pipeline:
//! read, parse, then for every definition × requested test type build a
//! prompt, consult the response cache, and only on a miss take a rate
//! limiter permit and call the provider. Per-definition failures are
//! logged and skipped; only file-level problems (unreadable file, parse
//! failure, missing adapter, write failure, cancellation) fail the file.
//! [`WorkerPool`] fans a file list out over a bounded set of workers
//! sharing one engine.

mod extract;
mod pool;

pub use pool::WorkerPool;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapters::AdapterRegistry;
use crate::cache::{CacheStats, ResponseCache, generate_key};
use crate::limit::RateLimiter;
use crate::providers::CompletionProvider;
use crate::types::{
    CompletionRequest, GenerationResult, Language, SourceFile, TestType, UsageMetrics,
};
use crate::{TestforgeError, telemetry};

/// Sampling temperature for generation requests. Low but non-zero:
/// deterministic enough for caching to pay off, varied enough to not
/// degenerate on retry.
const TEMPERATURE: f32 = 0.3;

/// Output token ceiling per generation request.
const MAX_OUTPUT_TOKENS: u32 = 2000;

/// System role for every generation request. The extraction step relies
/// on responses being code-only or code-fenced.
const SYSTEM_ROLE: &str =
    "You are an expert test engineer. Output only code, no explanations or surrounding prose.";

/// Engine tunables, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Test kinds generated per definition, in order.
    pub test_types: Vec<TestType>,
    /// Directory generated tests are written to. `None` places them next
    /// to the source per language convention.
    pub output_dir: Option<PathBuf>,
    /// Build everything but write nothing.
    pub dry_run: bool,
    /// Run the adapter's structural validation on written tests.
    pub validate: bool,
    /// Deadline for a single provider call.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            test_types: vec![TestType::Unit],
            output_dir: None,
            dry_run: false,
            validate: false,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Orchestrates test generation for source files.
///
/// Shared across workers behind an [`Arc`]; all interior state (cache,
/// limiter, provider usage counters) is concurrency-safe.
pub struct Engine {
    provider: Arc<dyn CompletionProvider>,
    registry: AdapterRegistry,
    cache: ResponseCache,
    limiter: RateLimiter,
    config: EngineConfig,
    cancel: CancellationToken,
}

impl Engine {
    /// Build an engine around a configured provider.
    ///
    /// `cache_entries` and `requests_per_minute` of 0 select the
    /// component defaults. Requires a tokio runtime (the limiter spawns
    /// its refill task).
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        registry: AdapterRegistry,
        config: EngineConfig,
        cache_entries: u64,
        requests_per_minute: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            registry,
            cache: ResponseCache::new(cache_entries),
            limiter: RateLimiter::new(requests_per_minute),
            config,
            cancel,
        }
    }

    /// Whether an adapter is registered for the language.
    pub fn has_adapter(&self, language: Language) -> bool {
        self.registry.has(language)
    }

    /// Token for cooperatively stopping in-flight generation.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Provider usage counters accumulated so far.
    pub fn usage(&self) -> UsageMetrics {
        self.provider.usage()
    }

    /// Response cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Generate tests for one source file.
    ///
    /// Always returns a result; failures are recorded on it rather than
    /// raised, so one bad file never takes down a run.
    pub async fn generate(&self, file: &SourceFile) -> GenerationResult {
        let Some(adapter) = self.registry.get(file.language) else {
            return GenerationResult::failed(
                file,
                TestforgeError::AdapterMissing(file.language.to_string()).to_string(),
            );
        };

        let content = match tokio::fs::read_to_string(&file.path).await {
            Ok(content) => content,
            Err(e) => return GenerationResult::failed(file, format!("read failed: {e}")),
        };

        let ast = match adapter.parse_file(&content) {
            Ok(ast) => ast,
            Err(e) => return GenerationResult::failed(file, e.to_string()),
        };

        let definitions = adapter.extract_definitions(&ast);
        let mut result = GenerationResult::for_file(file);
        if definitions.is_empty() {
            debug!(path = %file.path.display(), "no testable definitions");
            return result;
        }
        info!(
            path = %file.path.display(),
            definitions = definitions.len(),
            "generating tests"
        );

        let backend_model = format!("{}/{}", self.provider.name(), self.provider.model());
        let mut sections: Vec<String> = Vec::new();

        for def in &definitions {
            let mut generated_any = false;
            for test_type in &self.config.test_types {
                let prompt = adapter.render_prompt(*test_type, def, &ast);
                match self.complete_cached(&prompt, &backend_model).await {
                    Ok(response) => match extract::extract_code(&response, file.language) {
                        Ok(code) => {
                            sections.push(code);
                            generated_any = true;
                        }
                        Err(e) => skip_definition(&def.name, *test_type, &e),
                    },
                    Err(TestforgeError::Cancelled) => {
                        result.error = Some(TestforgeError::Cancelled.to_string());
                        return result;
                    }
                    Err(e) => skip_definition(&def.name, *test_type, &e),
                }
            }
            if generated_any {
                result.functions_tested.push(def.name.clone());
            }
        }

        if sections.is_empty() {
            result.error = Some("no tests generated: all definitions failed".to_string());
            return result;
        }

        result.test_code = adapter.prepend_boilerplate(&sections.join("\n\n"), &ast);
        let test_path = adapter.test_path(&file.path, self.config.output_dir.as_deref());
        result.test_path = Some(test_path.clone());

        if self.config.dry_run {
            info!(path = %test_path.display(), "dry run, not writing");
            return result;
        }

        if let Err(e) = write_test_file(&test_path, &result.test_code).await {
            result.error = Some(format!("write failed: {e}"));
            return result;
        }
        info!(
            path = %test_path.display(),
            functions = result.functions_tested.len(),
            "tests written"
        );

        if self.config.validate
            && let Err(e) = adapter.validate_tests(&result.test_code, &test_path)
        {
            warn!(path = %test_path.display(), error = %e, "validation failed");
            result.error = Some(e.to_string());
            result.validation_failed = true;
        }

        result
    }

    /// One completion, served from the cache when possible.
    ///
    /// A miss takes a rate limiter permit, runs the provider call under
    /// the request deadline, and stores the response for the next
    /// identical prompt.
    async fn complete_cached(&self, prompt: &str, backend_model: &str) -> crate::Result<String> {
        // The system role is a fixed constant, so it contributes nothing
        // to the key; the prompt and backend+model carry the meaning.
        let key = generate_key(prompt, "", backend_model);
        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %&key[..12], "cache hit");
            return Ok(hit.content);
        }

        self.limiter.wait(&self.cancel).await?;

        let request = CompletionRequest::new(prompt)
            .system_role(SYSTEM_ROLE)
            .max_tokens(MAX_OUTPUT_TOKENS)
            .temperature(TEMPERATURE);
        // A deadline miss is a per-definition Timeout; only the token
        // maps to Cancelled, which aborts the whole file.
        let response = tokio::time::timeout(self.config.request_timeout, async {
            tokio::select! {
                r = self.provider.complete(&request) => r,
                _ = self.cancel.cancelled() => Err(TestforgeError::Cancelled),
            }
        })
        .await
        .map_err(|_| TestforgeError::Timeout)??;

        self.cache.set(key, response.clone());
        Ok(response.content)
    }
}

fn skip_definition(name: &str, test_type: TestType, error: &TestforgeError) {
    warn!(definition = name, test_type = %test_type, error = %error, "skipping definition");
    metrics::counter!(telemetry::DEFINITIONS_SKIPPED_TOTAL,
        "reason" => skip_reason(error),
    )
    .increment(1);
}

fn skip_reason(error: &TestforgeError) -> &'static str {
    match error {
        TestforgeError::RateLimited { .. } => "rate_limited",
        TestforgeError::Timeout => "timeout",
        TestforgeError::ExtractionFailed => "extraction_failed",
        TestforgeError::EmptyResponse => "empty_response",
        _ => "provider_error",
    }
}

async fn write_test_file(path: &std::path::Path, code: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, code).await
}
