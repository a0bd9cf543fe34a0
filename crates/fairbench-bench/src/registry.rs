use std::str::FromStr;

use fairbench_core::{BenchConfig, Dataset, MetricsConfig};
use fairbench_metrics::{BaseMetric, MetricRegistry};

use crate::algorithm::Algorithm;
use crate::algorithms;
use crate::errors::{BenchError, Result};

/// Datasets, algorithms and the metric suite for one benchmark process.
/// Built once at startup and passed by reference.
pub struct BenchmarkRegistry {
    datasets: Vec<Box<dyn Dataset>>,
    algorithms: Vec<Box<dyn Algorithm>>,
    metrics: MetricRegistry,
}

impl Default for BenchmarkRegistry {
    fn default() -> Self {
        Self::new(MetricRegistry::standard())
    }
}

impl BenchmarkRegistry {
    /// Empty registry using the given metric suite.
    pub fn new(metrics: MetricRegistry) -> Self {
        Self {
            datasets: Vec::new(),
            algorithms: Vec::new(),
            metrics,
        }
    }

    /// Configured datasets, every built-in algorithm and the configured
    /// (or standard) metric suite.
    pub fn from_config(config: &BenchConfig) -> Result<Self> {
        let metrics = match &config.metrics {
            Some(selection) => metric_registry(selection)?,
            None => MetricRegistry::standard(),
        };

        let mut registry = Self::new(metrics);
        for spec in &config.datasets {
            spec.validate()?;
            registry.register_dataset(Box::new(spec.clone()));
        }
        for algorithm in algorithms::builtin() {
            registry.register_algorithm(algorithm);
        }
        Ok(registry)
    }

    pub fn register_dataset(&mut self, dataset: Box<dyn Dataset>) {
        self.datasets.push(dataset);
    }

    pub fn register_algorithm(&mut self, algorithm: Box<dyn Algorithm>) {
        self.algorithms.push(algorithm);
    }

    pub fn datasets(&self) -> &[Box<dyn Dataset>] {
        &self.datasets
    }

    pub fn algorithms(&self) -> &[Box<dyn Algorithm>] {
        &self.algorithms
    }

    pub fn metrics(&self) -> &MetricRegistry {
        &self.metrics
    }

    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.dataset_name()).collect()
    }

    pub fn algorithm_names(&self) -> Vec<&str> {
        self.algorithms.iter().map(|a| a.name()).collect()
    }

    /// Datasets in registration order, optionally restricted to `names`.
    /// Unknown names are an error.
    pub fn select_datasets(&self, names: Option<&[String]>) -> Result<Vec<&dyn Dataset>> {
        let Some(names) = names else {
            return Ok(self.datasets.iter().map(Box::as_ref).collect());
        };
        for name in names {
            if !self.datasets.iter().any(|d| d.dataset_name() == name) {
                return Err(BenchError::UnknownDataset(name.clone()));
            }
        }
        Ok(self
            .datasets
            .iter()
            .filter(|d| names.iter().any(|name| name == d.dataset_name()))
            .map(Box::as_ref)
            .collect())
    }

    /// Algorithms in registration order, optionally restricted to `names`.
    pub fn select_algorithms(&self, names: Option<&[String]>) -> Result<Vec<&dyn Algorithm>> {
        let Some(names) = names else {
            return Ok(self.algorithms.iter().map(Box::as_ref).collect());
        };
        for name in names {
            if !self.algorithms.iter().any(|a| a.name() == name) {
                return Err(BenchError::UnknownAlgorithm(name.clone()));
            }
        }
        Ok(self
            .algorithms
            .iter()
            .filter(|a| names.iter().any(|name| name == a.name()))
            .map(Box::as_ref)
            .collect())
    }
}

fn metric_registry(selection: &MetricsConfig) -> Result<MetricRegistry> {
    let parse = |names: &[String]| -> Result<Vec<BaseMetric>> {
        names
            .iter()
            .map(|name| BaseMetric::from_str(name).map_err(BenchError::from))
            .collect()
    };
    let plain = parse(&selection.plain)?;
    let sensitive = parse(&selection.sensitive)?;
    Ok(MetricRegistry::from_bases(&plain, &sensitive))
}

#[cfg(test)]
mod tests {
    use fairbench_core::DatasetSpec;
    use fairbench_metrics::{MetricError, MetricSpec};

    use super::*;

    fn spec(name: &str) -> DatasetSpec {
        DatasetSpec {
            name: name.to_string(),
            raw_file: format!("{name}.csv"),
            class_attribute: "y".to_string(),
            positive_class: "yes".to_string(),
            sensitive_attributes: vec!["sex".to_string()],
            privileged_classes: vec!["m".to_string()],
            categorical_features: Vec::new(),
            features_to_keep: Vec::new(),
            missing_marker: "?".to_string(),
        }
    }

    #[test]
    fn config_registers_datasets_and_builtins() {
        let config = BenchConfig {
            datasets: vec![spec("adult"), spec("german")],
            ..BenchConfig::default()
        };
        let registry = BenchmarkRegistry::from_config(&config).expect("registry");
        assert_eq!(registry.dataset_names(), vec!["adult", "german"]);
        assert_eq!(registry.algorithm_names(), vec!["Majority", "NaiveBayes"]);
        assert_eq!(registry.metrics(), &MetricRegistry::standard());
    }

    #[test]
    fn metric_selection_is_parsed() {
        let config = BenchConfig {
            metrics: Some(MetricsConfig {
                plain: vec!["accuracy".to_string()],
                sensitive: vec!["tpr".to_string()],
            }),
            ..BenchConfig::default()
        };
        let registry = BenchmarkRegistry::from_config(&config).expect("registry");
        assert_eq!(
            registry.metrics().specs(),
            &[
                MetricSpec::Plain(BaseMetric::Accuracy),
                MetricSpec::Sensitive(BaseMetric::Tpr)
            ]
        );
    }

    #[test]
    fn unknown_metric_name_is_rejected() {
        let config = BenchConfig {
            metrics: Some(MetricsConfig {
                plain: vec!["precision@k".to_string()],
                sensitive: Vec::new(),
            }),
            ..BenchConfig::default()
        };
        let err = BenchmarkRegistry::from_config(&config).err().expect("error");
        assert!(matches!(
            err,
            BenchError::Metric(MetricError::UnknownMetric(ref name)) if name == "precision@k"
        ));
    }

    #[test]
    fn selection_rejects_unknown_names() {
        let config = BenchConfig {
            datasets: vec![spec("adult")],
            ..BenchConfig::default()
        };
        let registry = BenchmarkRegistry::from_config(&config).expect("registry");
        let selected = registry
            .select_algorithms(Some(&["NaiveBayes".to_string()]))
            .expect("select");
        assert_eq!(selected.len(), 1);
        assert!(matches!(
            registry.select_datasets(Some(&["compas".to_string()])),
            Err(BenchError::UnknownDataset(_))
        ));
    }
}
