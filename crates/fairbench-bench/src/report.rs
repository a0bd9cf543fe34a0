use crate::model::BenchmarkReport;
use crate::summary::ResultsSummary;

/// Render a markdown overview of a finished run.
pub fn render_run_report(run_id: &str, report: &BenchmarkReport) -> String {
    let mut lines = Vec::new();

    lines.push("# Fairbench Run Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- run_id: {run_id}"));
    lines.push(format!("- files: {}", report.files.len()));
    lines.push(format!("- rows: {}", report.rows_written()));
    lines.push(format!("- trial_failures: {}", report.trial_failures.len()));
    lines.push(format!("- config_failures: {}", report.config_failures.len()));
    lines.push(String::new());

    lines.push("## Results files".to_string());
    lines.push("| dataset | sensitive | tag | rows | path |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());
    for file in &report.files {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            file.dataset,
            file.sensitive_attribute,
            file.tag,
            file.rows,
            file.path.display()
        ));
    }
    lines.push(String::new());

    if !report.config_failures.is_empty() {
        lines.push("## Configuration errors".to_string());
        for failure in &report.config_failures {
            let tag = failure
                .tag
                .map(|tag| format!(" [{tag}]"))
                .unwrap_or_default();
            lines.push(format!("- {}{}: {}", failure.dataset, tag, failure.message));
        }
        lines.push(String::new());
    }

    if !report.trial_failures.is_empty() {
        lines.push("## Failed trials".to_string());
        for failure in &report.trial_failures {
            lines.push(format!(
                "- {} / {} / {} / {} trial {}: {}",
                failure.dataset,
                failure.sensitive_attribute,
                failure.tag,
                failure.algorithm,
                failure.trial,
                failure.message
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Render one results file summary as a markdown table per algorithm.
pub fn render_summary(summary: &ResultsSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("# Summary of {}", summary.path.display()));
    lines.push(String::new());
    for algorithm in &summary.algorithms {
        lines.push(format!(
            "## {} {} ({} trials)",
            algorithm.algorithm, algorithm.params, algorithm.trials
        ));
        lines.push("| metric | mean | sd | n |".to_string());
        lines.push("| --- | --- | --- | --- |".to_string());
        for stats in &algorithm.metrics {
            lines.push(format!(
                "| {} | {} | {} | {} |",
                stats.metric,
                format_value(stats.mean),
                format_value(stats.std_dev),
                stats.count
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn format_value(value: fairbench_metrics::MetricValue) -> String {
    match value.value() {
        Some(number) => format!("{number:.4}"),
        None => "NA".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use fairbench_core::Tag;
    use fairbench_metrics::MetricValue;

    use super::*;
    use crate::model::{ConfigFailure, ResultsFile};
    use crate::summary::{AlgorithmSummary, MetricStats};

    #[test]
    fn run_report_lists_files_and_config_errors() {
        let report = BenchmarkReport {
            files: vec![ResultsFile {
                dataset: "adult".to_string(),
                sensitive_attribute: "sex".to_string(),
                tag: Tag::Original,
                path: PathBuf::from("adult_sex_original.csv"),
                rows: 20,
            }],
            trial_failures: Vec::new(),
            config_failures: vec![ConfigFailure {
                dataset: "german".to_string(),
                tag: Some(Tag::Numerical),
                message: "no privileged value for 'age'".to_string(),
            }],
        };
        let rendered = render_run_report("run_1", &report);
        assert!(rendered.contains("| adult | sex | original | 20 | adult_sex_original.csv |"));
        assert!(rendered.contains("- german [numerical]: no privileged value for 'age'"));
        assert!(!rendered.contains("## Failed trials"));
    }

    #[test]
    fn summary_renders_na_and_rounded_values() {
        let summary = ResultsSummary {
            path: PathBuf::from("x.csv"),
            metrics: vec!["accuracy".to_string(), "TPR".to_string()],
            algorithms: vec![AlgorithmSummary {
                algorithm: "Majority".to_string(),
                params: "{}".to_string(),
                trials: 3,
                metrics: vec![
                    MetricStats {
                        metric: "accuracy".to_string(),
                        count: 3,
                        mean: MetricValue::Value(2.0 / 3.0),
                        std_dev: MetricValue::Value(0.0),
                    },
                    MetricStats {
                        metric: "TPR".to_string(),
                        count: 0,
                        mean: MetricValue::Na,
                        std_dev: MetricValue::Na,
                    },
                ],
            }],
        };
        let rendered = render_summary(&summary);
        assert!(rendered.contains("## Majority {} (3 trials)"));
        assert!(rendered.contains("| accuracy | 0.6667 | 0.0000 | 3 |"));
        assert!(rendered.contains("| TPR | NA | NA | 0 |"));
    }
}
