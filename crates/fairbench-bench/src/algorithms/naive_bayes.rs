use std::collections::{BTreeMap, BTreeSet};

use fairbench_core::{Frame, Tag};

use crate::algorithm::{Algorithm, AlgorithmInput, Params, float_param};
use crate::errors::{BenchError, Result};

const ALPHA_PARAM: &str = "alpha";
const ALPHA_DEFAULT: f64 = 1.0;
const TAGS: [Tag; 2] = [Tag::Original, Tag::CategoricalBinsensitive];

/// Categorical naive Bayes with Laplace smoothing over the non-sensitive
/// features. Values never seen in training fall back to the smoothed prior.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveBayes;

impl Algorithm for NaiveBayes {
    fn name(&self) -> &str {
        "NaiveBayes"
    }

    fn supported_tags(&self) -> &[Tag] {
        &TAGS
    }

    fn default_params(&self) -> Params {
        let mut params = Params::new();
        params.insert(ALPHA_PARAM.to_string(), ALPHA_DEFAULT.to_string());
        params
    }

    fn run(&self, input: &AlgorithmInput<'_>) -> Result<Vec<String>> {
        let alpha = float_param(self.name(), input.params, ALPHA_PARAM, ALPHA_DEFAULT)?;
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(self.failure(format!("alpha must be non-negative, got {alpha}")));
        }

        let features = input.feature_columns();
        let model = Model::fit(input.train, input.class_attribute, &features, alpha)?
            .ok_or_else(|| self.failure("training split is empty".to_string()))?;

        let mut test_columns = Vec::with_capacity(features.len());
        for feature in &features {
            test_columns.push(input.test.require_column(feature, "test data")?);
        }

        let predictions = (0..input.test.len())
            .map(|row| {
                let values = test_columns.iter().map(|column| column[row].as_str());
                model.predict(values)
            })
            .collect();
        Ok(predictions)
    }
}

impl NaiveBayes {
    fn failure(&self, message: String) -> BenchError {
        BenchError::Algorithm {
            algorithm: self.name().to_string(),
            message,
        }
    }
}

/// Per-class counts gathered from the training split.
struct Model {
    alpha: f64,
    total: usize,
    /// Class label in sorted order with its row count.
    classes: Vec<(String, usize)>,
    /// Per feature: distinct value count, and (class, value) counts.
    features: Vec<FeatureCounts>,
}

struct FeatureCounts {
    levels: usize,
    counts: BTreeMap<(usize, String), usize>,
}

impl Model {
    /// `None` when the training split has no rows. Missing columns are
    /// reported as such.
    fn fit(
        train: &Frame,
        class_attribute: &str,
        features: &[&str],
        alpha: f64,
    ) -> Result<Option<Self>> {
        let labels = train.require_column(class_attribute, "training data")?;
        if labels.is_empty() {
            return Ok(None);
        }

        let mut class_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in labels {
            *class_counts.entry(label.as_str()).or_default() += 1;
        }
        let classes: Vec<(String, usize)> = class_counts
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect();
        let class_index: BTreeMap<&str, usize> = classes
            .iter()
            .enumerate()
            .map(|(idx, (label, _))| (label.as_str(), idx))
            .collect();

        let mut per_feature = Vec::with_capacity(features.len());
        for feature in features {
            let column = train.require_column(feature, "training data")?;
            let mut levels = BTreeSet::new();
            let mut counts = BTreeMap::new();
            for (value, label) in column.iter().zip(labels) {
                levels.insert(value.as_str());
                let Some(class) = class_index.get(label.as_str()).copied() else {
                    continue;
                };
                *counts.entry((class, value.clone())).or_default() += 1;
            }
            per_feature.push(FeatureCounts {
                levels: levels.len(),
                counts,
            });
        }

        Ok(Some(Self {
            alpha,
            total: labels.len(),
            classes,
            features: per_feature,
        }))
    }

    /// Highest log-posterior wins; ties keep the earlier class.
    fn predict<'v>(&self, values: impl Iterator<Item = &'v str> + Clone) -> String {
        let mut best: Option<(usize, f64)> = None;
        for (class, (_, class_count)) in self.classes.iter().enumerate() {
            let prior = (*class_count as f64) / (self.total as f64);
            let mut score = prior.ln();
            for (feature, value) in self.features.iter().zip(values.clone()) {
                let seen = feature
                    .counts
                    .get(&(class, value.to_string()))
                    .copied()
                    .unwrap_or(0);
                let numerator = seen as f64 + self.alpha;
                let denominator = *class_count as f64 + self.alpha * (feature.levels + 1) as f64;
                if denominator > 0.0 {
                    score += (numerator / denominator).ln();
                }
            }
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((class, score));
            }
        }
        best.map(|(class, _)| self.classes[class].0.clone())
            .unwrap_or_default()
    }
}
