mod registry;

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fairbench_bench::{
    BenchError, Benchmark, BenchmarkOptions, BenchmarkRegistry, render_run_report,
    render_summary, summarize_file,
};
use fairbench_core::{BenchConfig, Error as CoreError};
use fairbench_metrics::MetricSpec;
use registry::{
    RunConfig, RunContext, collect_git_info, init_run_logging, start_run, write_config,
    write_report, write_summary,
};
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_CONFIG: &str = "fairbench.toml";

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("benchmark error: {0}")]
    Bench(#[from] BenchError),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{count} configuration error(s); see {summary}")]
    ConfigFailures { count: usize, summary: PathBuf },
}

#[derive(Parser, Debug)]
#[command(name = "fairbench", version, about = "Fairness benchmark harness")]
struct Cli {
    /// Benchmark configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the benchmark and write results into a new run directory.
    Run(RunArgs),
    /// List available algorithms and datasets.
    List,
    /// Mean and standard deviation of every metric in a results file.
    Summarize(SummarizeArgs),
    /// Print the JSON Schema of the configuration file.
    Schema,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Number of train/test splits per combination.
    #[arg(long)]
    trials: Option<usize>,
    /// Dataset name(s) to run; all configured datasets when omitted.
    #[arg(long = "dataset", value_name = "NAME")]
    datasets: Vec<String>,
    /// Algorithm name(s) to run; all algorithms when omitted.
    #[arg(long = "algorithm", value_name = "NAME")]
    algorithms: Vec<String>,
    /// Override the config's results directory.
    #[arg(long)]
    results_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SummarizeArgs {
    /// Results CSV written by `fairbench run`.
    path: PathBuf,
    #[arg(long, value_enum, default_value_t = SummaryFormat::Markdown)]
    format: SummaryFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SummaryFormat {
    Markdown,
    Json,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::List) => run_list(&cli.config),
        Some(Command::Run(args)) => run_benchmark(&cli.config, args),
        Some(Command::Summarize(args)) => run_summarize(args),
        Some(Command::Schema) => run_schema(),
    }
}

/// The config is optional for listing: without one only the built-in
/// algorithms are shown.
fn run_list(config_path: &Path) -> Result<(), CliError> {
    let config = if config_path.exists() {
        BenchConfig::load(config_path)?
    } else {
        BenchConfig::default()
    };
    let registry = BenchmarkRegistry::from_config(&config)?;

    println!("Available algorithms:");
    for name in registry.algorithm_names() {
        println!("  {name}");
    }
    println!("Available datasets:");
    let datasets = registry.dataset_names();
    if datasets.is_empty() {
        println!("  (none; add [[datasets]] to {})", config_path.display());
    }
    for name in datasets {
        println!("  {name}");
    }
    Ok(())
}

fn run_benchmark(config_path: &Path, args: RunArgs) -> Result<(), CliError> {
    let RunArgs {
        trials,
        datasets,
        algorithms,
        results_dir,
    } = args;

    let config = BenchConfig::load(config_path)?;
    let bench_registry = BenchmarkRegistry::from_config(&config)?;

    let run_ctx = RunContext {
        run_id: Uuid::new_v4().to_string(),
        started_at: chrono::Utc::now(),
        results_dir: results_dir.unwrap_or_else(|| config.results_dir.clone()),
        config_path: config_path.to_path_buf(),
    };
    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    let options = BenchmarkOptions {
        num_trials: trials.unwrap_or(config.num_trials),
        datasets: non_empty(datasets),
        algorithms: non_empty(algorithms),
        data_dir: config.data_dir.clone(),
        out_dir: run_paths.run_root.clone(),
        seed: config.seed,
        test_fraction: config.test_fraction,
    };

    write_config(
        &run_paths,
        &RunConfig {
            run_id: &run_ctx.run_id,
            started_at: run_ctx.started_at.to_rfc3339(),
            config_path: &run_ctx.config_path,
            options: &options,
            datasets: bench_registry.dataset_names(),
            algorithms: bench_registry.algorithm_names(),
            metrics: bench_registry
                .metrics()
                .specs()
                .iter()
                .map(describe_spec)
                .collect(),
            git: collect_git_info(),
        },
    )?;

    tracing::info!(
        event = "run_started",
        run_id = %run_ctx.run_id,
        run_dir = %run_paths.run_root.display()
    );
    let timer = Instant::now();

    let report = Benchmark::new(options).run(&bench_registry)?;

    write_summary(&run_paths, &report)?;
    tracing::info!(event = "summary_written", path = %run_paths.summary_path.display());
    write_report(&run_paths, &render_run_report(&run_ctx.run_id, &report))?;
    tracing::info!(event = "report_written", path = %run_paths.report_path.display());

    let duration_ms = timer.elapsed().as_millis() as u64;
    if report.has_config_failures() {
        tracing::error!(
            event = "run_finished",
            status = "config_error",
            config_failures = report.config_failures.len(),
            duration_ms
        );
        return Err(CliError::ConfigFailures {
            count: report.config_failures.len(),
            summary: run_paths.summary_path,
        });
    }

    tracing::info!(
        event = "run_finished",
        status = "success",
        files = report.files.len(),
        trial_failures = report.trial_failures.len(),
        duration_ms
    );
    println!("{}", run_paths.run_root.display());
    Ok(())
}

fn run_summarize(args: SummarizeArgs) -> Result<(), CliError> {
    let summary = summarize_file(&args.path)?;
    match args.format {
        SummaryFormat::Markdown => println!("{}", render_summary(&summary)),
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn run_schema() -> Result<(), CliError> {
    let schema = schemars::schema_for!(BenchConfig);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() { None } else { Some(values) }
}

fn describe_spec(spec: &MetricSpec) -> String {
    match spec {
        MetricSpec::Plain(base) => base.name().to_string(),
        MetricSpec::Sensitive(base) => format!("sensitive:{}", base.name()),
    }
}
