use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::DatasetSpec;
use crate::error::{Error, Result};
use crate::processed::SplitOptions;

/// Number of train/test splits evaluated when nothing else is configured.
pub const NUM_TRIALS_DEFAULT: usize = 10;

/// Benchmark configuration, usually read from `fairbench.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BenchConfig {
    /// Directory holding the raw dataset files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory under which run directories are created.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_num_trials")]
    pub num_trials: usize,
    /// Share of rows held out for testing in each trial.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
    /// Metric selection; the standard suite when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

/// Base metric names evaluated over the whole test split (`plain`) and
/// expanded per sensitive group (`sensitive`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MetricsConfig {
    #[serde(default)]
    pub plain: Vec<String>,
    #[serde(default)]
    pub sensitive: Vec<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            results_dir: default_results_dir(),
            seed: 0,
            num_trials: NUM_TRIALS_DEFAULT,
            test_fraction: default_test_fraction(),
            datasets: Vec::new(),
            metrics: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_num_trials() -> usize {
    NUM_TRIALS_DEFAULT
}

fn default_test_fraction() -> f64 {
    1.0 / 3.0
}

impl BenchConfig {
    /// Read a TOML config. Relative directories are resolved against the
    /// config file's parent directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.data_dir = resolve(base, &config.data_dir);
            config.results_dir = resolve(base, &config.results_dir);
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BenchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(Error::InvalidConfig(format!(
                "test_fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for dataset in &self.datasets {
            dataset.validate()?;
            if !seen.insert(dataset.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "dataset '{}' declared twice",
                    dataset.name
                )));
            }
        }
        Ok(())
    }

    pub fn split_options(&self) -> SplitOptions {
        SplitOptions {
            seed: self.seed,
            test_fraction: self.test_fraction,
        }
    }

    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.name.clone()).collect()
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
seed = 3
num_trials = 2

[[datasets]]
name = "adult"
raw_file = "adult.csv"
class_attribute = "income-per-year"
positive_class = ">50K"
sensitive_attributes = ["race", "sex"]
privileged_classes = ["White", "Male"]
categorical_features = ["workclass"]
"#;

    #[test]
    fn parses_with_defaults() {
        let config = BenchConfig::from_toml_str(CONFIG).expect("config");
        assert_eq!(config.seed, 3);
        assert_eq!(config.num_trials, 2);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!((config.test_fraction - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(config.datasets[0].missing_marker, "?");
        assert!(config.datasets[0].features_to_keep.is_empty());
        assert!(config.metrics.is_none());
    }

    #[test]
    fn parses_metric_selection() {
        let content = format!("{CONFIG}\n[metrics]\nplain = [\"accuracy\"]\nsensitive = [\"TPR\", \"TNR\"]\n");
        let config = BenchConfig::from_toml_str(&content).expect("config");
        let metrics = config.metrics.expect("metrics section");
        assert_eq!(metrics.plain, vec!["accuracy"]);
        assert_eq!(metrics.sensitive, vec!["TPR", "TNR"]);
    }

    #[test]
    fn rejects_duplicate_datasets() {
        let doubled = format!("{CONFIG}\n{}", &CONFIG[CONFIG.find("[[datasets]]").unwrap()..]);
        let err = BenchConfig::from_toml_str(&doubled).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(ref message) if message.contains("twice")));
    }

    #[test]
    fn load_resolves_relative_directories() {
        let dir = std::env::temp_dir().join(format!("fairbench_config_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("fairbench.toml");
        std::fs::write(&path, CONFIG).expect("write config");

        let config = BenchConfig::load(&path).expect("load");
        assert_eq!(config.data_dir, dir.join("data"));
        assert_eq!(config.results_dir, dir.join("results"));
    }
}
