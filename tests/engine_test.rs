//! End-to-end engine behaviour with a scripted provider.
//!
//! Covers fenced extraction and boilerplate, cache deduplication,
//! partial-failure isolation across definitions, dry-run, validation
//! annotations, and cancellation.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use testforge::{
    AdapterRegistry, CompletionProvider, CompletionRequest, CompletionResponse, Engine,
    EngineConfig, Language, Result, SourceFile, TestforgeError, UsageMetrics,
};

/// One scripted reply per provider call, in order. The script repeats
/// its last entry once exhausted.
enum Reply {
    Ok(&'static str),
    RateLimited,
    /// Never answers within any reasonable deadline.
    Stall,
}

struct ScriptedProvider {
    script: Vec<Reply>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn always(content: &'static str) -> Arc<Self> {
        Self::new(vec![Reply::Ok(content)])
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(req.prompt.clone());
        let reply = self.script.get(n).unwrap_or(
            self.script.last().expect("script must not be empty"),
        );
        match reply {
            Reply::Ok(content) => Ok(CompletionResponse {
                content: (*content).to_string(),
                tokens_input: 100,
                tokens_output: 50,
                cached: false,
                model: "scripted-1".to_string(),
                finish_reason: Some("stop".to_string()),
            }),
            Reply::RateLimited => Err(TestforgeError::RateLimited { retry_after: None }),
            Reply::Stall => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                unreachable!("stalled call must be dropped by the deadline")
            }
        }
    }

    fn usage(&self) -> UsageMetrics {
        UsageMetrics::default()
    }
}

const GO_SOURCE: &str = r#"package calculator

func Add(a, b int) int {
	return a + b
}
"#;

const GO_THREE_FUNCS: &str = r#"package calculator

func Add(a, b int) int {
	return a + b
}

func Sub(a, b int) int {
	return a - b
}

func Mul(a, b int) int {
	return a * b
}
"#;

const FENCED_REPLY: &str =
    "Here you go:\n\n```go\nfunc TestAdd(t *testing.T) {\n\tassert.Equal(t, 2, Add(1, 1))\n}\n```\n";

fn engine(provider: Arc<ScriptedProvider>, config: EngineConfig) -> Engine {
    Engine::new(
        provider,
        AdapterRegistry::with_defaults(),
        config,
        0,
        1000, // high enough that the limiter never blocks these tests
        CancellationToken::new(),
    )
}

fn write_source(dir: &Path, name: &str, content: &str) -> SourceFile {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    SourceFile::new(path, Language::from_path(Path::new(name)).unwrap())
}

#[tokio::test]
async fn fenced_response_becomes_a_test_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_SOURCE);

    let provider = ScriptedProvider::always(FENCED_REPLY);
    let engine = engine(Arc::clone(&provider), EngineConfig::default());

    let result = engine.generate(&file).await;
    assert!(result.is_success(), "unexpected error: {:?}", result.error);
    assert_eq!(result.functions_tested, vec!["Add"]);

    let test_path = result.test_path.expect("test path should be set");
    assert!(test_path.ends_with("calc_test.go"));
    let written = std::fs::read_to_string(&test_path).unwrap();
    assert!(written.starts_with("package calculator_test"));
    assert!(written.contains("func TestAdd"));
    assert!(!written.contains("```"), "fences must not survive extraction");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn identical_second_file_is_served_from_cache() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_SOURCE);

    let provider = ScriptedProvider::always(FENCED_REPLY);
    let engine = engine(Arc::clone(&provider), EngineConfig::default());

    let first = engine.generate(&file).await;
    let second = engine.generate(&file).await;
    assert!(first.is_success() && second.is_success());
    assert_eq!(first.test_code, second.test_code);

    // One network call total; the second run hit the cache.
    assert_eq!(provider.calls(), 1);
    let stats = engine.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn failing_middle_definition_does_not_poison_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_THREE_FUNCS);

    let provider = ScriptedProvider::new(vec![
        Reply::Ok("```go\nfunc TestAdd(t *testing.T) {}\n```"),
        Reply::RateLimited,
        Reply::Ok("```go\nfunc TestMul(t *testing.T) {}\n```"),
    ]);
    let engine = engine(Arc::clone(&provider), EngineConfig::default());

    let result = engine.generate(&file).await;
    assert!(result.is_success(), "unexpected error: {:?}", result.error);
    assert_eq!(result.functions_tested, vec!["Add", "Mul"]);
    assert!(result.test_code.contains("TestAdd"));
    assert!(!result.test_code.contains("TestSub"));
    assert!(result.test_code.contains("TestMul"));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn slow_middle_definition_times_out_without_aborting_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_THREE_FUNCS);

    let provider = ScriptedProvider::new(vec![
        Reply::Ok("```go\nfunc TestAdd(t *testing.T) {}\n```"),
        Reply::Stall,
        Reply::Ok("```go\nfunc TestMul(t *testing.T) {}\n```"),
    ]);
    let engine = engine(
        Arc::clone(&provider),
        EngineConfig {
            request_timeout: std::time::Duration::from_millis(50),
            ..EngineConfig::default()
        },
    );

    // The deadline on definition 2 is a skip, not a file abort: the
    // remaining definitions are still attempted.
    let result = engine.generate(&file).await;
    assert!(result.is_success(), "unexpected error: {:?}", result.error);
    assert_eq!(result.functions_tested, vec!["Add", "Mul"]);
    assert!(result.test_code.contains("TestAdd"));
    assert!(!result.test_code.contains("TestSub"));
    assert!(result.test_code.contains("TestMul"));
    assert_eq!(provider.calls(), 3, "all three definitions attempted");
}

#[tokio::test]
async fn all_definitions_failing_fails_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_SOURCE);

    let provider = ScriptedProvider::new(vec![Reply::RateLimited]);
    let engine = engine(provider, EngineConfig::default());

    let result = engine.generate(&file).await;
    assert!(!result.is_success());
    assert!(result.test_path.is_none());
}

#[tokio::test]
async fn dry_run_writes_nothing_but_returns_code() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_SOURCE);

    let provider = ScriptedProvider::always(FENCED_REPLY);
    let engine = engine(
        provider,
        EngineConfig {
            dry_run: true,
            ..EngineConfig::default()
        },
    );

    let result = engine.generate(&file).await;
    assert!(result.is_success());
    assert!(result.test_code.contains("func TestAdd"));
    let test_path = result.test_path.expect("path still reported in dry run");
    assert!(!test_path.exists());
}

#[tokio::test]
async fn validation_failure_is_annotated_but_file_kept() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_SOURCE);

    // No `func Test` in the reply, so the Go adapter's validation fails.
    let provider = ScriptedProvider::always("```go\nvar x = 1\n```");
    let engine = engine(
        provider,
        EngineConfig {
            validate: true,
            ..EngineConfig::default()
        },
    );

    let result = engine.generate(&file).await;
    assert!(result.validation_failed);
    assert!(result.error.as_deref().unwrap().contains("validation"));
    assert!(result.is_success(), "validation failures are non-fatal");
    assert!(result.test_path.unwrap().exists(), "written file is kept");
}

#[tokio::test]
async fn zero_definitions_is_an_empty_success() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "empty.go", "package empty\n\nfunc main() {}\n");

    let provider = ScriptedProvider::always(FENCED_REPLY);
    let engine = engine(Arc::clone(&provider), EngineConfig::default());

    let result = engine.generate(&file).await;
    assert!(result.is_success());
    assert!(result.functions_tested.is_empty());
    assert!(result.test_path.is_none());
    assert_eq!(provider.calls(), 0, "no provider calls for nothing to test");
}

#[tokio::test]
async fn unreadable_file_fails_only_that_file() {
    let tmp = tempfile::tempdir().unwrap();
    let file = SourceFile::new(tmp.path().join("missing.go"), Language::Go);

    let provider = ScriptedProvider::always(FENCED_REPLY);
    let engine = engine(provider, EngineConfig::default());

    let result = engine.generate(&file).await;
    assert!(!result.is_success());
    assert!(result.error.as_deref().unwrap().contains("read failed"));
}

#[tokio::test]
async fn cancellation_aborts_pending_generation() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_SOURCE);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let provider = ScriptedProvider::always(FENCED_REPLY);
    let engine = Engine::new(
        Arc::clone(&provider) as Arc<dyn CompletionProvider>,
        AdapterRegistry::with_defaults(),
        EngineConfig::default(),
        0,
        60,
        cancel,
    );

    // The cache-miss path goes through the limiter, which refuses work
    // on a cancelled token before consuming a permit.
    let result = engine.generate(&file).await;
    assert!(!result.is_success());
    assert!(result.error.as_deref().unwrap().contains("cancelled"));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn multiple_test_types_concatenate_sections() {
    let tmp = tempfile::tempdir().unwrap();
    let file = write_source(tmp.path(), "calc.go", GO_SOURCE);

    let provider = ScriptedProvider::new(vec![
        Reply::Ok("```go\nfunc TestAddUnit(t *testing.T) {}\n```"),
        Reply::Ok("```go\nfunc TestAddEdge(t *testing.T) {}\n```"),
    ]);
    let engine = engine(
        Arc::clone(&provider),
        EngineConfig {
            test_types: vec![
                testforge::TestType::Unit,
                testforge::TestType::EdgeCases,
            ],
            ..EngineConfig::default()
        },
    );

    let result = engine.generate(&file).await;
    assert!(result.is_success());
    assert!(result.test_code.contains("TestAddUnit"));
    assert!(result.test_code.contains("TestAddEdge"));
    assert_eq!(result.functions_tested, vec!["Add"]);
    assert_eq!(provider.calls(), 2, "distinct prompts do not share a cache key");
}
