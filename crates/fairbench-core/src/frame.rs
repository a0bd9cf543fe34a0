use std::path::Path;

use crate::error::{Error, Result};

/// Column-major table of string cells.
///
/// Every column holds exactly `len()` values; constructors and mutators
/// reject anything that would break that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Vec<String>>,
    rows: usize,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, values)` pairs, preserving their order.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut frame = Frame::new();
        for (name, values) in columns {
            frame.push_column(name, values)?;
        }
        Ok(frame)
    }

    /// Read a headed CSV file; cells are trimmed.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let names = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let mut columns = vec![Vec::new(); names.len()];
        let mut rows = 0usize;

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != names.len() {
                return Err(Error::InvalidFrame(format!(
                    "{} row {} has {} fields, expected {}",
                    path.display(),
                    row_idx + 1,
                    record.len(),
                    names.len()
                )));
            }
            for (col_idx, value) in record.iter().enumerate() {
                columns[col_idx].push(value.to_string());
            }
            rows += 1;
        }

        Ok(Self {
            names,
            columns,
            rows,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.columns[idx].as_slice())
    }

    /// Like [`Frame::column`], but a missing column is an error naming `context`.
    pub fn require_column(&self, name: &str, context: &str) -> Result<&[String]> {
        self.column(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            context: context.to_string(),
        })
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<String>) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(Error::InvalidFrame(format!("duplicate column '{name}'")));
        }
        if self.names.is_empty() {
            self.rows = values.len();
        } else if values.len() != self.rows {
            return Err(Error::InvalidFrame(format!(
                "column '{name}' has {} values, expected {}",
                values.len(),
                self.rows
            )));
        }
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Rewrite every cell of an existing column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> String,
    {
        let idx = self.position(name).ok_or_else(|| Error::MissingColumn {
            column: name.to_string(),
            context: "frame".to_string(),
        })?;
        for cell in self.columns[idx].iter_mut() {
            *cell = f(cell);
        }
        Ok(())
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, names: &[String]) -> Result<Frame> {
        let mut frame = Frame::new();
        for name in names {
            let values = self.require_column(name, "select")?.to_vec();
            frame.push_column(name.clone(), values)?;
        }
        frame.rows = self.rows;
        Ok(frame)
    }

    /// Copy the rows at `indices` (in that order) into a new frame.
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        let columns = self
            .columns
            .iter()
            .map(|values| indices.iter().map(|&idx| values[idx].clone()).collect())
            .collect();
        Frame {
            names: self.names.clone(),
            columns,
            rows: indices.len(),
        }
    }

    /// Keep the rows for which `keep(row_idx)` is true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Frame
    where
        F: FnMut(usize) -> bool,
    {
        let indices = (0..self.rows).filter(|&idx| keep(idx)).collect::<Vec<_>>();
        self.take_rows(&indices)
    }

    /// Cells of one row, in column order.
    pub fn row(&self, idx: usize) -> Vec<&str> {
        self.columns
            .iter()
            .map(|values| values[idx].as_str())
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Frame::from_columns([
            ("a", strings(&["1", "2"])),
            ("b", strings(&["x"])),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::InvalidFrame(_)));
    }

    #[test]
    fn take_rows_keeps_column_alignment() {
        let frame = Frame::from_columns([
            ("a", strings(&["1", "2", "3"])),
            ("b", strings(&["x", "y", "z"])),
        ])
        .expect("frame");

        let taken = frame.take_rows(&[2, 0]);
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.column("a").unwrap(), strings(&["3", "1"]).as_slice());
        assert_eq!(taken.row(0), vec!["3", "z"]);
    }

    #[test]
    fn select_reports_missing_column() {
        let frame = Frame::from_columns([("a", strings(&["1"]))]).expect("frame");
        let err = frame.select(&strings(&["a", "b"])).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "b"));
    }
}
