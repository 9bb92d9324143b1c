//! testforge — LLM-backed test generation CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use testforge::{
    AdapterRegistry, Config, Engine, EngineConfig, ProviderConfig, RunReport, TestType, WorkerPool,
    analyze, providers, scanner,
};

/// Testforge CLI
#[derive(Parser)]
#[command(name = "testforge")]
#[command(version)]
#[command(about = "Generate tests for your code with LLM backends")]
struct Args {
    /// Path to a configuration file (default: testforge.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate tests for a file or directory tree
    Generate {
        /// Directory to scan for source files
        #[arg(short, long, default_value = ".", conflicts_with = "file")]
        path: PathBuf,

        /// Single source file to process
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Test types to generate (unit, edge-cases, negative, table-driven, integration)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        test_types: Vec<TestType>,

        /// Backend: anthropic, openai, gemini, groq
        #[arg(long)]
        provider: Option<String>,

        /// Model override
        #[arg(short, long)]
        model: Option<String>,

        /// Output directory for generated tests (default: next to sources)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Concurrent workers
        #[arg(long)]
        parallel: Option<usize>,

        /// Requests-per-minute budget across all workers
        #[arg(long)]
        rpm: Option<u32>,

        /// Build everything but write nothing
        #[arg(long)]
        dry_run: bool,

        /// Structurally validate generated tests
        #[arg(long)]
        validate: bool,
    },

    /// Estimate generation size and API cost for a source tree
    Analyze {
        /// Directory or file to analyze
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Include the estimated API cost for the configured backend
        #[arg(long)]
        cost_estimate: bool,

        /// Per-file detail instead of the summary
        #[arg(long)]
        detail: bool,

        /// Emit the analysis as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "run failed");
        std::process::exit(1);
    }
}

async fn run() -> testforge::Result<()> {
    let args = Args::parse();
    let config = match args.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match args.command {
        Command::Generate {
            path,
            file,
            test_types,
            provider,
            model,
            output,
            parallel,
            rpm,
            dry_run,
            validate,
        } => {
            generate(
                &config,
                GenerateArgs {
                    root: file.unwrap_or(path),
                    test_types,
                    provider,
                    model,
                    output,
                    parallel,
                    rpm,
                    dry_run,
                    validate,
                },
            )
            .await
        }
        Command::Analyze {
            path,
            cost_estimate,
            detail,
            json,
        } => run_analyze(&config, &path, cost_estimate, detail, json),
    }
}

fn run_analyze(
    config: &Config,
    path: &std::path::Path,
    cost_estimate: bool,
    detail: bool,
    json: bool,
) -> testforge::Result<()> {
    let files = scanner::scan(path)?;
    let analysis = analyze::analyze_files(
        &files,
        &AdapterRegistry::with_defaults(),
        &config.llm.provider,
        config.llm.model.as_deref().unwrap_or_default(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Path:             {}", path.display());
    println!("Total files:      {}", analysis.total_files);
    println!("Total lines:      {}", analysis.total_lines);
    println!("Definitions:      {}", analysis.total_definitions);
    for (language, stats) in &analysis.by_language {
        println!(
            "  {language}: {} files, {} lines, {} definitions",
            stats.files, stats.lines, stats.definitions
        );
    }
    if cost_estimate {
        println!(
            "Estimated tokens: {} in / {} out",
            analysis.estimated_tokens_input, analysis.estimated_tokens_output
        );
        println!(
            "Estimated cost:   ${:.2} USD ({})",
            analysis.estimated_cost_usd, config.llm.provider
        );
    }
    if detail {
        for file in &analysis.files {
            println!(
                "  {} ({}): {} lines, {} definitions, ~{} tokens",
                file.path.display(),
                file.language,
                file.lines,
                file.definitions,
                file.estimated_tokens
            );
        }
    }
    Ok(())
}

struct GenerateArgs {
    root: PathBuf,
    test_types: Vec<TestType>,
    provider: Option<String>,
    model: Option<String>,
    output: Option<PathBuf>,
    parallel: Option<usize>,
    rpm: Option<u32>,
    dry_run: bool,
    validate: bool,
}

async fn generate(config: &Config, args: GenerateArgs) -> testforge::Result<()> {
    let files = scanner::scan(&args.root)?;
    if files.is_empty() {
        warn!(path = %args.root.display(), "no source files found");
        return Ok(());
    }
    info!(files = files.len(), "scanned source tree");

    let provider_name = args
        .provider
        .unwrap_or_else(|| config.llm.provider.clone());
    let mut provider_config = ProviderConfig::new()
        .max_tokens(config.llm.max_tokens)
        .temperature(config.llm.temperature);
    if let Some(model) = args.model.or_else(|| config.llm.model.clone()) {
        provider_config = provider_config.model(model);
    }
    if let Some(key) = config.llm.api_key.clone() {
        provider_config = provider_config.api_key(key);
    }
    let provider = providers::from_name(&provider_name, provider_config)?;

    let test_types = if args.test_types.is_empty() {
        config.generation.test_types.clone()
    } else {
        args.test_types
    };
    let engine_config = EngineConfig {
        test_types,
        output_dir: args.output.or_else(|| config.output.dir.clone()),
        dry_run: args.dry_run,
        validate: args.validate || config.generation.validate,
        request_timeout: Duration::from_secs(config.llm.timeout_seconds),
    };

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping");
            ctrl_c_cancel.cancel();
        }
    });

    let engine = Arc::new(Engine::new(
        provider,
        AdapterRegistry::with_defaults(),
        engine_config,
        config.llm.cache_entries,
        args.rpm.unwrap_or(config.llm.requests_per_minute),
        cancel,
    ));
    let pool = WorkerPool::new(
        Arc::clone(&engine),
        args.parallel.unwrap_or(config.generation.parallel),
    );

    let start = Instant::now();
    let results = pool.process_files(files).await;

    for result in &results {
        let path = result
            .source
            .as_ref()
            .map(|s| s.path.display().to_string())
            .unwrap_or_default();
        match &result.error {
            Some(e) if !result.validation_failed => error!(path = %path, error = %e, "failed"),
            Some(e) => warn!(path = %path, error = %e, "generated with validation warning"),
            None => info!(path = %path, functions = result.functions_tested.len(), "ok"),
        }
    }

    let usage = engine.usage();
    let report = RunReport::new(&results, &usage, &engine.cache_stats(), start.elapsed());
    let report_path = report.write(&config.output.metrics_dir)?;
    info!(
        files = report.total_files,
        success = report.success_count,
        errors = report.error_count,
        cost_usd = report.total_cost_usd,
        report = %report_path.display(),
        "run complete"
    );

    if report.error_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
