use std::collections::BTreeMap;
use std::fs;
use std::time::Instant;

use fairbench_core::{Dataset, ProcessedData, Tag, TrainTestSplits};
use fairbench_metrics::{MetricSet, MetricValue, SensitiveCatalog, SensitiveLists, TrialInput};

use crate::algorithm::{Algorithm, AlgorithmInput, format_params};
use crate::errors::{BenchError, Result};
use crate::model::{BenchmarkOptions, BenchmarkReport, ConfigFailure, ResultsFile, TrialFailure};
use crate::output::ResultsWriter;
use crate::registry::BenchmarkRegistry;

/// Drives every (dataset, sensitive attribute, algorithm, tag, trial)
/// combination and writes one results CSV per (dataset, attribute, tag).
///
/// Algorithm and metric failures are confined to their trial. A dataset
/// whose metric suite cannot be resolved is skipped and recorded.
#[derive(Debug, Clone)]
pub struct Benchmark {
    options: BenchmarkOptions,
}

/// Everything that stays fixed across the trials of one dataset.
struct DatasetRun<'a> {
    dataset: &'a dyn Dataset,
    splits: TrainTestSplits,
    sensitive_attributes: Vec<String>,
    metric_sets: BTreeMap<Tag, MetricSet>,
}

/// One trial's identifying coordinates.
#[derive(Clone, Copy)]
struct TrialKey<'a> {
    sensitive: &'a str,
    tag: Tag,
    trial: usize,
}

/// Outcome of one trial: the formatted params and the metric row.
struct TrialRow {
    params: String,
    values: Vec<MetricValue>,
}

impl Benchmark {
    pub fn new(options: BenchmarkOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BenchmarkOptions {
        &self.options
    }

    /// Run the benchmark. Errors are returned only for problems that
    /// invalidate the whole run (bad selection, unwritable output).
    pub fn run(&self, registry: &BenchmarkRegistry) -> Result<BenchmarkReport> {
        let started = Instant::now();
        let datasets = registry.select_datasets(self.options.datasets.as_deref())?;
        let algorithms = registry.select_algorithms(self.options.algorithms.as_deref())?;
        fs::create_dir_all(&self.options.out_dir)?;

        tracing::info!(
            event = "benchmark_started",
            datasets = datasets.len(),
            algorithms = algorithms.len(),
            num_trials = self.options.num_trials,
            out_dir = %self.options.out_dir.display()
        );

        let tags = used_tags(&algorithms);
        let mut report = BenchmarkReport::default();
        for dataset in datasets {
            let prepared = match self.prepare(registry, dataset, &tags) {
                Ok(prepared) => prepared,
                Err(failure) => {
                    tracing::error!(
                        event = "dataset_skipped",
                        dataset = %failure.dataset,
                        tag = ?failure.tag,
                        error = %failure.message
                    );
                    report.config_failures.push(failure);
                    continue;
                }
            };
            self.run_dataset(&prepared, &algorithms, &mut report)?;
        }

        tracing::info!(
            event = "benchmark_finished",
            files = report.files.len(),
            rows = report.rows_written(),
            trial_failures = report.trial_failures.len(),
            config_failures = report.config_failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        Ok(report)
    }

    /// Load, split and resolve the metric suite for every tag in use.
    fn prepare<'a>(
        &self,
        registry: &BenchmarkRegistry,
        dataset: &'a dyn Dataset,
        tags: &[Tag],
    ) -> std::result::Result<DatasetRun<'a>, ConfigFailure> {
        let failure = |tag: Option<Tag>, err: BenchError| ConfigFailure {
            dataset: dataset.dataset_name().to_string(),
            tag,
            message: err.to_string(),
        };

        let declared = dataset.sensitive_attributes().len();
        let privileged = dataset.privileged_class_names().len();
        if privileged > declared {
            let err = fairbench_core::Error::InvalidConfig(format!(
                "dataset '{}' lists {privileged} privileged classes for {declared} sensitive attributes",
                dataset.dataset_name()
            ));
            return Err(failure(None, err.into()));
        }

        let processed = ProcessedData::load(dataset, &self.options.data_dir)
            .map_err(|err| failure(None, err.into()))?;
        let splits = processed
            .create_train_test_splits(self.options.num_trials, self.options.split_options())
            .map_err(|err| failure(None, err.into()))?;

        let sensitive_attributes = dataset.sensitive_attributes_with_joint();
        let mut metric_sets = BTreeMap::new();
        for &tag in tags {
            let values = processed
                .sensitive_values(tag)
                .map_err(|err| failure(Some(tag), err.into()))?;
            let catalog = SensitiveCatalog::new(
                sensitive_attributes.clone(),
                dataset.privileged_class_names_with_joint(tag),
                values,
            );
            let set = registry
                .metrics()
                .resolve(&catalog)
                .map_err(|err| failure(Some(tag), err.into()))?;
            tracing::debug!(
                event = "metrics_resolved",
                dataset = %dataset.dataset_name(),
                tag = %tag,
                metrics = set.len()
            );
            metric_sets.insert(tag, set);
        }

        Ok(DatasetRun {
            dataset,
            splits,
            sensitive_attributes,
            metric_sets,
        })
    }

    fn run_dataset(
        &self,
        run: &DatasetRun<'_>,
        algorithms: &[&dyn Algorithm],
        report: &mut BenchmarkReport,
    ) -> Result<()> {
        let dataset_name = run.dataset.dataset_name();
        tracing::info!(
            event = "dataset_started",
            dataset = %dataset_name,
            sensitive_attributes = run.sensitive_attributes.len(),
            tags = run.metric_sets.len()
        );

        for sensitive in &run.sensitive_attributes {
            let mut writers = BTreeMap::new();
            for (tag, set) in &run.metric_sets {
                let path = self
                    .options
                    .out_dir
                    .join(run.dataset.results_filename(sensitive, *tag));
                writers.insert(*tag, ResultsWriter::create(&path, &set.header())?);
            }

            for algorithm in algorithms {
                for trial in 0..self.options.num_trials {
                    for &tag in algorithm.supported_tags() {
                        let (Some(writer), Some(set)) =
                            (writers.get_mut(&tag), run.metric_sets.get(&tag))
                        else {
                            continue;
                        };
                        let key = TrialKey {
                            sensitive,
                            tag,
                            trial,
                        };
                        match run_eval_alg(run, *algorithm, set, key) {
                            Ok(row) => {
                                writer.write_row(algorithm.name(), &row.params, &row.values)?;
                                tracing::debug!(
                                    event = "trial_finished",
                                    dataset = %dataset_name,
                                    sensitive = %sensitive,
                                    tag = %tag,
                                    algorithm = %algorithm.name(),
                                    trial
                                );
                            }
                            Err(err) => {
                                tracing::warn!(
                                    event = "trial_failed",
                                    dataset = %dataset_name,
                                    sensitive = %sensitive,
                                    tag = %tag,
                                    algorithm = %algorithm.name(),
                                    trial,
                                    error = %err
                                );
                                report.trial_failures.push(TrialFailure {
                                    dataset: dataset_name.to_string(),
                                    sensitive_attribute: sensitive.clone(),
                                    tag,
                                    algorithm: algorithm.name().to_string(),
                                    trial,
                                    message: err.to_string(),
                                });
                            }
                        }
                    }
                }
            }

            for (tag, writer) in writers {
                report.files.push(results_file(dataset_name, sensitive, tag, &writer));
            }
        }
        Ok(())
    }
}

/// Train, predict and evaluate one trial.
fn run_eval_alg(
    run: &DatasetRun<'_>,
    algorithm: &dyn Algorithm,
    metrics: &MetricSet,
    key: TrialKey<'_>,
) -> Result<TrialRow> {
    let dataset = run.dataset;
    let split = run.splits.get(key.tag, key.trial).ok_or_else(|| {
        BenchError::InvalidResults(format!(
            "no split for tag {} trial {}",
            key.tag, key.trial
        ))
    })?;

    let privileged = dataset.privileged_class_names_with_joint(key.tag);
    let positive = dataset.positive_class_val(key.tag);
    let params = algorithm.default_params();

    let input = AlgorithmInput {
        train: &split.train,
        test: &split.test,
        class_attribute: dataset.class_attribute(),
        positive: &positive,
        sensitive_attributes: &run.sensitive_attributes,
        single_sensitive: key.sensitive,
        privileged: &privileged,
        params: &params,
    };
    let predicted = algorithm.run(&input)?;

    let actual = split
        .test
        .require_column(dataset.class_attribute(), "test data")?;
    let mut sensitive = SensitiveLists::new();
    for attribute in &run.sensitive_attributes {
        let column = split.test.require_column(attribute, "test data")?;
        sensitive.insert(attribute.clone(), column.to_vec());
    }

    let trial = TrialInput::new(
        actual,
        &predicted,
        &sensitive,
        key.sensitive,
        &privileged,
        &positive,
    );
    trial.check_lengths()?;
    let values = metrics.evaluate(&trial)?;

    Ok(TrialRow {
        params: format_params(&params),
        values,
    })
}

/// Tags needed by at least one selected algorithm, in tag order.
fn used_tags(algorithms: &[&dyn Algorithm]) -> Vec<Tag> {
    let mut tags = algorithms
        .iter()
        .flat_map(|algorithm| algorithm.supported_tags().iter().copied())
        .collect::<Vec<_>>();
    tags.sort();
    tags.dedup();
    tags
}

fn results_file(dataset: &str, sensitive: &str, tag: Tag, writer: &ResultsWriter) -> ResultsFile {
    ResultsFile {
        dataset: dataset.to_string(),
        sensitive_attribute: sensitive.to_string(),
        tag,
        path: writer.path().to_path_buf(),
        rows: writer.rows(),
    }
}

