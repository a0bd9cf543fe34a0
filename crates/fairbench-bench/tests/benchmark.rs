use std::fs;
use std::path::{Path, PathBuf};

use fairbench_bench::{
    Algorithm, AlgorithmInput, BenchError, Benchmark, BenchmarkOptions, BenchmarkRegistry,
    summarize_file,
};
use fairbench_core::{DatasetSpec, Tag};
use fairbench_metrics::{BaseMetric, MetricRegistry};
use uuid::Uuid;

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fairbench-{label}-{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_toy_dataset(dir: &Path) {
    let mut content = String::from("weather,sex,y\n");
    let rows = [
        ("sun", "m", "yes"),
        ("sun", "f", "yes"),
        ("rain", "m", "no"),
        ("rain", "f", "no"),
        ("sun", "m", "yes"),
        ("rain", "f", "yes"),
    ];
    for (weather, sex, y) in rows {
        content.push_str(&format!("{weather},{sex},{y}\n"));
    }
    fs::write(dir.join("toy.csv"), content).expect("write dataset");
}

fn toy_spec(privileged: &[&str]) -> DatasetSpec {
    DatasetSpec {
        name: "toy".to_string(),
        raw_file: "toy.csv".to_string(),
        class_attribute: "y".to_string(),
        positive_class: "yes".to_string(),
        sensitive_attributes: vec!["sex".to_string()],
        privileged_classes: privileged.iter().map(|value| value.to_string()).collect(),
        categorical_features: vec!["weather".to_string()],
        features_to_keep: Vec::new(),
        missing_marker: "?".to_string(),
    }
}

fn options(data_dir: &Path, out_dir: &Path, algorithms: &[&str]) -> BenchmarkOptions {
    BenchmarkOptions {
        num_trials: 2,
        algorithms: Some(algorithms.iter().map(|name| name.to_string()).collect()),
        data_dir: data_dir.to_path_buf(),
        out_dir: out_dir.to_path_buf(),
        ..BenchmarkOptions::default()
    }
}

fn registry(spec: DatasetSpec, algorithm: Box<dyn Algorithm>) -> BenchmarkRegistry {
    let mut registry = BenchmarkRegistry::new(MetricRegistry::from_bases(
        &[BaseMetric::Accuracy],
        &[BaseMetric::Accuracy],
    ));
    registry.register_dataset(Box::new(spec));
    registry.register_algorithm(algorithm);
    registry
}

#[test]
fn two_trials_write_header_and_two_aligned_rows() {
    let data_dir = temp_dir("data");
    let out_dir = temp_dir("out");
    write_toy_dataset(&data_dir);

    let registry = registry(toy_spec(&["m"]), Box::new(fairbench_bench::algorithms::Majority));
    let report = Benchmark::new(options(&data_dir, &out_dir, &["Majority"]))
        .run(&registry)
        .expect("run");

    assert!(report.trial_failures.is_empty());
    assert!(report.config_failures.is_empty());
    assert_eq!(report.files.len(), Tag::ALL.len());

    let path = out_dir.join("toy_sex_original.csv");
    let content = fs::read_to_string(&path).expect("results");
    let lines = content.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "algorithm,params,accuracy,f-sex-accuracy,m-sex-accuracy,sex-accuracy,\
         f-sex-accuracy / m-sex-accuracy,sex-accuracyRatio"
    );
    let width = lines[0].split(',').count();
    for row in &lines[1..] {
        assert!(row.starts_with("Majority,{},"));
        assert_eq!(row.split(',').count(), width);
    }

    let summary = summarize_file(&path).expect("summary");
    assert_eq!(summary.algorithm("Majority").expect("majority").trials, 2);

    fs::remove_dir_all(&data_dir).ok();
    fs::remove_dir_all(&out_dir).ok();
}

struct Exploding;

impl Algorithm for Exploding {
    fn name(&self) -> &str {
        "Exploding"
    }

    fn supported_tags(&self) -> &[Tag] {
        &[Tag::Original]
    }

    fn run(&self, _input: &AlgorithmInput<'_>) -> fairbench_bench::Result<Vec<String>> {
        Err(BenchError::Algorithm {
            algorithm: "Exploding".to_string(),
            message: "diverged".to_string(),
        })
    }
}

#[test]
fn failing_trials_are_recorded_and_skipped() {
    let data_dir = temp_dir("data");
    let out_dir = temp_dir("out");
    write_toy_dataset(&data_dir);

    let registry = registry(toy_spec(&["m"]), Box::new(Exploding));
    let report = Benchmark::new(options(&data_dir, &out_dir, &["Exploding"]))
        .run(&registry)
        .expect("run");

    assert_eq!(report.trial_failures.len(), 2);
    assert_eq!(report.trial_failures[1].trial, 1);
    assert!(report.trial_failures[0].message.contains("diverged"));
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].rows, 0);

    let content = fs::read_to_string(out_dir.join("toy_sex_original.csv")).expect("results");
    assert_eq!(content.lines().count(), 1);

    fs::remove_dir_all(&data_dir).ok();
    fs::remove_dir_all(&out_dir).ok();
}

#[test]
fn missing_privileged_value_is_a_config_failure() {
    let data_dir = temp_dir("data");
    let out_dir = temp_dir("out");
    write_toy_dataset(&data_dir);

    let registry = registry(toy_spec(&[]), Box::new(fairbench_bench::algorithms::Majority));
    let report = Benchmark::new(options(&data_dir, &out_dir, &["Majority"]))
        .run(&registry)
        .expect("run");

    assert!(report.has_config_failures());
    assert!(report.config_failures[0].message.contains("'sex'"));
    assert!(report.files.is_empty());

    fs::remove_dir_all(&data_dir).ok();
    fs::remove_dir_all(&out_dir).ok();
}

#[test]
fn surplus_privileged_values_are_a_config_failure() {
    let data_dir = temp_dir("data");
    let out_dir = temp_dir("out");
    write_toy_dataset(&data_dir);

    // Registered directly, so DatasetSpec::validate never sees it.
    let registry = registry(toy_spec(&["m", "f"]), Box::new(fairbench_bench::algorithms::Majority));
    let report = Benchmark::new(options(&data_dir, &out_dir, &["Majority"]))
        .run(&registry)
        .expect("run");

    assert_eq!(report.config_failures.len(), 1);
    assert!(report.config_failures[0].message.contains("2 privileged classes"));
    assert!(report.files.is_empty());

    fs::remove_dir_all(&data_dir).ok();
    fs::remove_dir_all(&out_dir).ok();
}

#[test]
fn unknown_algorithm_selection_fails_the_run() {
    let out_dir = temp_dir("out");
    let registry = registry(toy_spec(&["m"]), Box::new(Exploding));
    let err = Benchmark::new(options(&out_dir, &out_dir, &["SVM"]))
        .run(&registry)
        .unwrap_err();
    assert!(matches!(err, BenchError::UnknownAlgorithm(ref name) if name == "SVM"));
    fs::remove_dir_all(&out_dir).ok();
}
