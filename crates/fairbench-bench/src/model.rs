use std::path::PathBuf;

use fairbench_core::{NUM_TRIALS_DEFAULT, SplitOptions, Tag};
use serde::{Deserialize, Serialize};

/// Options for one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkOptions {
    pub num_trials: usize,
    /// Restrict the run to these datasets; all registered when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets: Option<Vec<String>>,
    /// Restrict the run to these algorithms; all registered when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithms: Option<Vec<String>>,
    /// Directory holding the raw dataset files.
    pub data_dir: PathBuf,
    /// Directory receiving the results CSVs.
    pub out_dir: PathBuf,
    pub seed: u64,
    pub test_fraction: f64,
}

impl Default for BenchmarkOptions {
    fn default() -> Self {
        let split = SplitOptions::default();
        Self {
            num_trials: NUM_TRIALS_DEFAULT,
            datasets: None,
            algorithms: None,
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("results"),
            seed: split.seed,
            test_fraction: split.test_fraction,
        }
    }
}

impl BenchmarkOptions {
    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            seed: self.seed,
            test_fraction: self.test_fraction,
        }
    }
}

/// One results file produced by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsFile {
    pub dataset: String,
    pub sensitive_attribute: String,
    pub tag: Tag,
    pub path: PathBuf,
    pub rows: u64,
}

/// A trial whose algorithm or metrics failed. The rest of the run continued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialFailure {
    pub dataset: String,
    pub sensitive_attribute: String,
    pub tag: Tag,
    pub algorithm: String,
    pub trial: usize,
    pub message: String,
}

/// A dataset (or one of its tags) skipped because of a configuration error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFailure {
    pub dataset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    pub message: String,
}

/// Outcome of a benchmark run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub files: Vec<ResultsFile>,
    pub trial_failures: Vec<TrialFailure>,
    pub config_failures: Vec<ConfigFailure>,
}

impl BenchmarkReport {
    pub fn rows_written(&self) -> u64 {
        self.files.iter().map(|file| file.rows).sum()
    }

    pub fn has_config_failures(&self) -> bool {
        !self.config_failures.is_empty()
    }
}
