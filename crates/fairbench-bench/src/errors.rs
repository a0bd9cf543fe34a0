use fairbench_metrics::MetricError;
use thiserror::Error;

/// Errors emitted by the benchmark driver.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("core error: {0}")]
    Core(#[from] fairbench_core::Error),
    #[error("metric error: {0}")]
    Metric(#[from] MetricError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("algorithm '{algorithm}' failed: {message}")]
    Algorithm { algorithm: String, message: String },
    #[error("invalid results file: {0}")]
    InvalidResults(String),
}

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;
