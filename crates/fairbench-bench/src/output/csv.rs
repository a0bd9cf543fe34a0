use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fairbench_metrics::{HEADER_PREFIX, MetricValue};

use crate::errors::{BenchError, Result};

/// Append-only results CSV for one (dataset, sensitive attribute, tag).
///
/// Every row is flushed and synced to disk before `write_row` returns, so a
/// crash never loses a completed trial.
pub struct ResultsWriter {
    path: PathBuf,
    width: usize,
    rows: u64,
    writer: csv::Writer<File>,
}

impl ResultsWriter {
    /// Truncate `path` and write the header.
    pub fn create(path: &Path, header: &[String]) -> Result<Self> {
        if header.len() < HEADER_PREFIX.len()
            || header
                .iter()
                .zip(HEADER_PREFIX)
                .any(|(column, expected)| column != expected)
        {
            return Err(BenchError::InvalidResults(format!(
                "header of {} must start with {}",
                path.display(),
                HEADER_PREFIX.join(",")
            )));
        }

        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(header)?;
        let mut results = Self {
            path: path.to_path_buf(),
            width: header.len(),
            rows: 0,
            writer,
        };
        results.sync()?;
        Ok(results)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Write one trial's row: algorithm, params, then one value per metric.
    pub fn write_row(&mut self, algorithm: &str, params: &str, values: &[MetricValue]) -> Result<()> {
        if values.len() + HEADER_PREFIX.len() != self.width {
            return Err(BenchError::InvalidResults(format!(
                "{} values for {} metric columns in {}",
                values.len(),
                self.width - HEADER_PREFIX.len(),
                self.path.display()
            )));
        }

        let record = [algorithm.to_string(), params.to_string()]
            .into_iter()
            .chain(values.iter().map(MetricValue::to_string));
        self.writer.write_record(record)?;
        self.sync()?;
        self.rows += 1;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}
