use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fairbench_bench::{BenchmarkOptions, BenchmarkReport};

use super::RegistryResult;
use super::atomic::{write_bytes_atomic, write_json_atomic};

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    /// Parent directory of every run directory.
    pub results_dir: PathBuf,
    /// Config file the run was started from.
    pub config_path: PathBuf,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig<'a> {
    pub run_id: &'a str,
    pub started_at: String,
    pub config_path: &'a Path,
    pub options: &'a BenchmarkOptions,
    pub datasets: Vec<&'a str>,
    pub algorithms: Vec<&'a str>,
    pub metrics: Vec<String>,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub run_root: PathBuf,
    pub config_path: PathBuf,
    pub logs_path: PathBuf,
    pub summary_path: PathBuf,
    pub report_path: PathBuf,
}

/// Directory name for a run: `{timestamp}__run_{run_id}`.
pub fn run_dir_name(ctx: &RunContext) -> String {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    format!("{timestamp}__run_{}", ctx.run_id)
}

/// Create the run directory (results CSVs land directly in it) and the
/// empty log file.
pub fn start_run(ctx: &RunContext) -> RegistryResult<RunPaths> {
    let run_root = ctx.results_dir.join(run_dir_name(ctx));
    create_dir_all(&run_root)?;

    let logs_path = run_root.join("logs.ndjson");
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        config_path: run_root.join("config.json"),
        summary_path: run_root.join("summary.json"),
        report_path: run_root.join("report.md"),
        logs_path,
        run_root,
    })
}

pub fn write_config(paths: &RunPaths, config: &RunConfig<'_>) -> RegistryResult<()> {
    write_json_atomic(&paths.config_path, config)
}

pub fn write_summary(paths: &RunPaths, report: &BenchmarkReport) -> RegistryResult<()> {
    write_json_atomic(&paths.summary_path, report)
}

pub fn write_report(paths: &RunPaths, markdown: &str) -> RegistryResult<()> {
    write_bytes_atomic(&paths.report_path, markdown.as_bytes())
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}
