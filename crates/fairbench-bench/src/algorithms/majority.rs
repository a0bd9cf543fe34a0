use std::collections::BTreeMap;

use fairbench_core::Tag;

use crate::algorithm::{Algorithm, AlgorithmInput};
use crate::errors::{BenchError, Result};

/// Predicts the most frequent training label for every row. Ties go to the
/// label that sorts first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Majority;

impl Algorithm for Majority {
    fn name(&self) -> &str {
        "Majority"
    }

    fn supported_tags(&self) -> &[Tag] {
        &Tag::ALL
    }

    fn run(&self, input: &AlgorithmInput<'_>) -> Result<Vec<String>> {
        let labels = input
            .train
            .require_column(input.class_attribute, "training data")?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in labels {
            *counts.entry(label.as_str()).or_default() += 1;
        }

        let mut best: Option<(&str, usize)> = None;
        for (label, count) in counts {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((label, count));
            }
        }
        let (label, _) = best.ok_or_else(|| BenchError::Algorithm {
            algorithm: self.name().to_string(),
            message: "training split is empty".to_string(),
        })?;

        Ok(vec![label.to_string(); input.test.len()])
    }
}
