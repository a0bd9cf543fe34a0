use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use fairbench_metrics::{HEADER_PREFIX, MetricValue};
use serde::Serialize;

use crate::errors::{BenchError, Result};

/// Mean and spread of one metric column for one algorithm configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub metric: String,
    /// Numeric (non-NA) values the statistics were computed from.
    pub count: usize,
    pub mean: MetricValue,
    /// Population standard deviation.
    pub std_dev: MetricValue,
}

/// All metric statistics for one (algorithm, params) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlgorithmSummary {
    pub algorithm: String,
    pub params: String,
    pub trials: usize,
    pub metrics: Vec<MetricStats>,
}

/// Summary of one results file, algorithms in order of first appearance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsSummary {
    pub path: PathBuf,
    pub metrics: Vec<String>,
    pub algorithms: Vec<AlgorithmSummary>,
}

impl ResultsSummary {
    pub fn algorithm(&self, name: &str) -> Option<&AlgorithmSummary> {
        self.algorithms.iter().find(|summary| summary.algorithm == name)
    }
}

impl AlgorithmSummary {
    pub fn metric(&self, name: &str) -> Option<&MetricStats> {
        self.metrics.iter().find(|stats| stats.metric == name)
    }
}

/// Read a results CSV and summarize every metric column per algorithm
/// configuration.
pub fn summarize_file(path: &Path) -> Result<ResultsSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(File::open(path)?);

    let header = reader
        .headers()?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if header.len() < HEADER_PREFIX.len()
        || header
            .iter()
            .zip(HEADER_PREFIX)
            .any(|(column, expected)| column != expected)
    {
        return Err(BenchError::InvalidResults(format!(
            "{} does not start with {}",
            path.display(),
            HEADER_PREFIX.join(",")
        )));
    }
    let metrics = header[HEADER_PREFIX.len()..].to_vec();

    // (algorithm, params) -> per-metric samples, in first-seen order.
    let mut groups: Vec<(String, String, usize, Vec<Vec<f64>>)> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != header.len() {
            return Err(BenchError::InvalidResults(format!(
                "{} row {} has {} fields, header has {}",
                path.display(),
                line + 1,
                record.len(),
                header.len()
            )));
        }
        let algorithm = &record[0];
        let params = &record[1];

        let position = groups
            .iter()
            .position(|(a, p, _, _)| a == algorithm && p == params);
        let idx = match position {
            Some(idx) => idx,
            None => {
                groups.push((
                    algorithm.to_string(),
                    params.to_string(),
                    0,
                    vec![Vec::new(); metrics.len()],
                ));
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.2 += 1;
        for (samples, raw) in group.3.iter_mut().zip(record.iter().skip(HEADER_PREFIX.len())) {
            let value = MetricValue::from_str(raw)?;
            if let Some(number) = value.value() {
                samples.push(number);
            }
        }
    }

    let algorithms = groups
        .into_iter()
        .map(|(algorithm, params, trials, samples)| AlgorithmSummary {
            algorithm,
            params,
            trials,
            metrics: metrics
                .iter()
                .zip(samples)
                .map(|(metric, samples)| describe(metric, &samples))
                .collect(),
        })
        .collect();

    Ok(ResultsSummary {
        path: path.to_path_buf(),
        metrics,
        algorithms,
    })
}

fn describe(metric: &str, samples: &[f64]) -> MetricStats {
    let count = samples.len();
    if count == 0 {
        return MetricStats {
            metric: metric.to_string(),
            count,
            mean: MetricValue::Na,
            std_dev: MetricValue::Na,
        };
    }
    let n = count as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    MetricStats {
        metric: metric.to_string(),
        count,
        mean: MetricValue::from_f64(mean),
        std_dev: MetricValue::from_f64(variance.sqrt()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_results(content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("fairbench-summary-{}.csv", uuid::Uuid::new_v4()));
        fs::write(&path, content).expect("write");
        path
    }

    #[test]
    fn mean_and_population_sd_skip_na() {
        let path = write_results(
            "algorithm,params,accuracy,sex-TPR\n\
             Majority,{},0.5,NA\n\
             Majority,{},1,NA\n\
             NaiveBayes,{alpha: 1},0.75,0.2\n",
        );
        let summary = summarize_file(&path).expect("summary");
        assert_eq!(summary.metrics, vec!["accuracy", "sex-TPR"]);

        let majority = summary.algorithm("Majority").expect("majority");
        assert_eq!(majority.trials, 2);
        let accuracy = majority.metric("accuracy").expect("accuracy");
        assert_eq!(accuracy.mean, MetricValue::Value(0.75));
        assert_eq!(accuracy.std_dev, MetricValue::Value(0.25));
        let tpr = majority.metric("sex-TPR").expect("tpr");
        assert_eq!(tpr.count, 0);
        assert_eq!(tpr.mean, MetricValue::Na);

        let nb = summary.algorithm("NaiveBayes").expect("nb");
        assert_eq!(nb.metric("sex-TPR").expect("tpr").std_dev, MetricValue::Value(0.0));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_foreign_header() {
        let path = write_results("name,score\nx,1\n");
        assert!(matches!(
            summarize_file(&path),
            Err(BenchError::InvalidResults(_))
        ));
        fs::remove_file(&path).ok();
    }
}
