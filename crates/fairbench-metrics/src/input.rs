use std::collections::BTreeMap;

use crate::errors::{MetricError, Result};

/// Sensitive attribute name mapped to its per-row values.
pub type SensitiveLists = BTreeMap<String, Vec<String>>;

/// Everything a metric sees for one trial. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct TrialInput<'a> {
    /// Ground-truth labels.
    pub actual: &'a [String],
    /// Predicted labels, aligned with `actual`.
    pub predicted: &'a [String],
    /// Row-aligned values for every sensitive attribute of the dataset.
    pub sensitive: &'a SensitiveLists,
    /// Attribute the current results file is about.
    pub single_sensitive: &'a str,
    /// Privileged values of every sensitive attribute (joint included).
    pub privileged: &'a [String],
    /// Label denoting the desired outcome.
    pub positive: &'a str,
    /// Rows the metric is restricted to; every row when `None`.
    pub selection: Option<&'a [usize]>,
}

impl<'a> TrialInput<'a> {
    pub fn new(
        actual: &'a [String],
        predicted: &'a [String],
        sensitive: &'a SensitiveLists,
        single_sensitive: &'a str,
        privileged: &'a [String],
        positive: &'a str,
    ) -> Self {
        Self {
            actual,
            predicted,
            sensitive,
            single_sensitive,
            privileged,
            positive,
            selection: None,
        }
    }

    /// Same lists, restricted to `rows`. Indices refer to the full lists.
    pub fn select<'b>(&self, rows: &'b [usize]) -> TrialInput<'b>
    where
        'a: 'b,
    {
        TrialInput {
            actual: self.actual,
            predicted: self.predicted,
            sensitive: self.sensitive,
            single_sensitive: self.single_sensitive,
            privileged: self.privileged,
            positive: self.positive,
            selection: Some(rows),
        }
    }

    /// Indices of the rows in view, in list order.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        let (selected, all) = match self.selection {
            Some(rows) => (Some(rows.iter().copied()), None),
            None => (None, Some(0..self.actual.len())),
        };
        selected.into_iter().flatten().chain(all.into_iter().flatten())
    }

    /// Rows in view.
    pub fn len(&self) -> usize {
        self.selection.map_or(self.actual.len(), <[usize]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every list must have one entry per row, and a selection may only
    /// name existing rows.
    pub fn check_lengths(&self) -> Result<()> {
        if self.predicted.len() != self.actual.len() {
            return Err(MetricError::LengthMismatch(format!(
                "{} predictions for {} labels",
                self.predicted.len(),
                self.actual.len()
            )));
        }
        for (attribute, values) in self.sensitive {
            if values.len() != self.actual.len() {
                return Err(MetricError::LengthMismatch(format!(
                    "sensitive attribute '{attribute}' has {} values for {} labels",
                    values.len(),
                    self.actual.len()
                )));
            }
        }
        if let Some(row) = self
            .selection
            .and_then(|rows| rows.iter().find(|row| **row >= self.actual.len()))
        {
            return Err(MetricError::LengthMismatch(format!(
                "selected row {row} out of {} labels",
                self.actual.len()
            )));
        }
        Ok(())
    }

    pub fn sensitive_column(&self, attribute: &str) -> Result<&'a [String]> {
        self.sensitive
            .get(attribute)
            .map(Vec::as_slice)
            .ok_or_else(|| MetricError::MissingSensitiveColumn {
                attribute: attribute.to_string(),
            })
    }

    pub fn is_privileged(&self, value: &str) -> bool {
        self.privileged.iter().any(|candidate| candidate == value)
    }
}
