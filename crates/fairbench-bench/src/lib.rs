//! Benchmark driver for fairbench.
//!
//! A [`Benchmark`] walks every configured dataset, sensitive attribute,
//! algorithm, tag and trial, evaluates the resolved metric suite and appends
//! one row per trial to the matching results CSV.

pub mod algorithm;
pub mod algorithms;
pub mod engine;
pub mod errors;
pub mod model;
pub mod output;
pub mod registry;
pub mod report;
pub mod summary;

pub use algorithm::{Algorithm, AlgorithmInput, Params, format_params};
pub use engine::Benchmark;
pub use errors::{BenchError, Result};
pub use model::{BenchmarkOptions, BenchmarkReport, ConfigFailure, ResultsFile, TrialFailure};
pub use output::ResultsWriter;
pub use registry::BenchmarkRegistry;
pub use report::{render_run_report, render_summary};
pub use summary::{AlgorithmSummary, MetricStats, ResultsSummary, summarize_file};
