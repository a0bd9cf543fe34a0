use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::dataset::{BINARY_FALSE, BINARY_TRUE, Dataset, Tag};
use crate::error::{Error, Result};
use crate::frame::Frame;

/// Train/test split parameters.
#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    /// Base seed; trial `i` shuffles with `seed + i`.
    pub seed: u64,
    /// Share of rows placed in the test split.
    pub test_fraction: f64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            test_fraction: 1.0 / 3.0,
        }
    }
}

/// One trial's train and test frames.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Frame,
    pub test: Frame,
}

/// Splits for every trial, per tag. Trial `i` uses the same row partition
/// under every tag.
#[derive(Debug, Clone, Default)]
pub struct TrainTestSplits {
    by_tag: BTreeMap<Tag, Vec<TrainTestSplit>>,
}

impl TrainTestSplits {
    pub fn get(&self, tag: Tag, trial: usize) -> Option<&TrainTestSplit> {
        self.by_tag.get(&tag).and_then(|splits| splits.get(trial))
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.by_tag.keys().copied()
    }

    pub fn num_trials(&self) -> usize {
        self.by_tag.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// A dataset cleaned once and rendered under every [`Tag`].
#[derive(Debug, Clone)]
pub struct ProcessedData {
    dataset_name: String,
    sensitive_attributes: Vec<String>,
    frames: BTreeMap<Tag, Frame>,
}

impl ProcessedData {
    /// Load the raw file from `data_dir` and process it.
    pub fn load(dataset: &dyn Dataset, data_dir: &Path) -> Result<Self> {
        let raw = dataset.load_raw(data_dir)?;
        Self::new(dataset, &raw)
    }

    pub fn new(dataset: &dyn Dataset, raw: &Frame) -> Result<Self> {
        let cleaned = clean(dataset, raw)?;
        tracing::debug!(
            event = "dataset_cleaned",
            dataset = %dataset.dataset_name(),
            raw_rows = raw.len(),
            rows = cleaned.len()
        );

        let mut frames = BTreeMap::new();
        for tag in Tag::ALL {
            frames.insert(tag, render_tag(dataset, &cleaned, tag)?);
        }

        Ok(Self {
            dataset_name: dataset.dataset_name().to_string(),
            sensitive_attributes: dataset.sensitive_attributes_with_joint(),
            frames,
        })
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn frame(&self, tag: Tag) -> Result<&Frame> {
        self.frames
            .get(&tag)
            .ok_or_else(|| Error::UnknownTag(tag.to_string()))
    }

    /// Distinct values of each sensitive attribute (joint included) under
    /// `tag`, sorted so column order is stable across trials and runs.
    pub fn sensitive_values(&self, tag: Tag) -> Result<BTreeMap<String, Vec<String>>> {
        let frame = self.frame(tag)?;
        let mut values = BTreeMap::new();
        for attr in &self.sensitive_attributes {
            let column = frame.require_column(attr, &self.dataset_name)?;
            let distinct = column.iter().cloned().collect::<BTreeSet<_>>();
            values.insert(attr.clone(), distinct.into_iter().collect());
        }
        Ok(values)
    }

    /// Shuffle the row indices once per trial and cut every tag's frame
    /// along the same partition.
    pub fn create_train_test_splits(
        &self,
        num_trials: usize,
        options: SplitOptions,
    ) -> Result<TrainTestSplits> {
        if !(0.0..1.0).contains(&options.test_fraction) {
            return Err(Error::InvalidConfig(format!(
                "test_fraction must be in [0, 1), got {}",
                options.test_fraction
            )));
        }

        let rows = self.frames.values().next().map(Frame::len).unwrap_or(0);
        let test_len = ((rows as f64) * options.test_fraction).round() as usize;

        let mut by_tag: BTreeMap<Tag, Vec<TrainTestSplit>> = BTreeMap::new();
        for trial in 0..num_trials {
            let mut indices = (0..rows).collect::<Vec<_>>();
            let mut rng = ChaCha8Rng::seed_from_u64(options.seed.wrapping_add(trial as u64));
            indices.shuffle(&mut rng);
            let (test_idx, train_idx) = indices.split_at(test_len);

            for (tag, frame) in &self.frames {
                by_tag.entry(*tag).or_default().push(TrainTestSplit {
                    train: frame.take_rows(train_idx),
                    test: frame.take_rows(test_idx),
                });
            }
        }

        Ok(TrainTestSplits { by_tag })
    }
}

fn clean(dataset: &dyn Dataset, raw: &Frame) -> Result<Frame> {
    let context = format!("dataset '{}'", dataset.dataset_name());
    raw.require_column(dataset.class_attribute(), &context)?;
    for attr in dataset.sensitive_attributes() {
        raw.require_column(attr, &context)?;
    }

    let kept = if dataset.features_to_keep().is_empty() {
        raw.clone()
    } else {
        raw.select(dataset.features_to_keep())?
    };

    let marker = dataset.missing_marker();
    let columns = kept
        .column_names()
        .iter()
        .filter_map(|name| kept.column(name))
        .collect::<Vec<_>>();
    Ok(kept.filter_rows(|row| {
        columns
            .iter()
            .all(|values| !values[row].is_empty() && values[row] != marker)
    }))
}

fn render_tag(dataset: &dyn Dataset, cleaned: &Frame, tag: Tag) -> Result<Frame> {
    let mut frame = if tag.is_numerical() {
        one_hot(dataset, cleaned)?
    } else {
        cleaned.clone()
    };

    if tag.is_binsensitive() {
        for (attr, privileged) in dataset
            .sensitive_attributes()
            .iter()
            .zip(dataset.privileged_class_names())
        {
            frame.map_column(attr, |value| binarize(value == privileged))?;
        }
        let positive = dataset.positive_class();
        frame.map_column(dataset.class_attribute(), |value| {
            binarize(value == positive)
        })?;
    }

    let attrs = dataset.sensitive_attributes();
    if attrs.len() > 1 {
        let parts = attrs
            .iter()
            .map(|attr| frame.require_column(attr, dataset.dataset_name()))
            .collect::<Result<Vec<_>>>()?;
        let joint = (0..frame.len())
            .map(|row| {
                parts
                    .iter()
                    .map(|values| values[row].as_str())
                    .collect::<Vec<_>>()
                    .join("-")
            })
            .collect::<Vec<_>>();
        frame.push_column(attrs.join("-"), joint)?;
    }

    Ok(frame)
}

fn one_hot(dataset: &dyn Dataset, cleaned: &Frame) -> Result<Frame> {
    let mut frame = Frame::new();
    for name in cleaned.column_names() {
        let values = cleaned.require_column(name, "one-hot")?;
        let is_categorical = dataset.categorical_features().contains(name)
            && name != dataset.class_attribute()
            && !dataset.sensitive_attributes().contains(name);

        if !is_categorical {
            frame.push_column(name.clone(), values.to_vec())?;
            continue;
        }

        let levels = values.iter().collect::<BTreeSet<_>>();
        for level in levels {
            let encoded = values
                .iter()
                .map(|value| binarize(value == level))
                .collect();
            frame.push_column(format!("{name}_{level}"), encoded)?;
        }
    }
    Ok(frame)
}

fn binarize(flag: bool) -> String {
    let value = if flag { BINARY_TRUE } else { BINARY_FALSE };
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetSpec;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn spec() -> DatasetSpec {
        DatasetSpec {
            name: "toy".to_string(),
            raw_file: "toy.csv".to_string(),
            class_attribute: "label".to_string(),
            positive_class: "yes".to_string(),
            sensitive_attributes: strings(&["race", "sex"]),
            privileged_classes: strings(&["White", "Male"]),
            categorical_features: strings(&["job"]),
            features_to_keep: Vec::new(),
            missing_marker: "?".to_string(),
        }
    }

    fn raw() -> Frame {
        Frame::from_columns([
            ("race", strings(&["White", "Black", "White", "Black", "White", "?"])),
            ("sex", strings(&["Male", "Female", "Female", "Male", "Male", "Male"])),
            ("job", strings(&["a", "b", "a", "c", "b", "a"])),
            ("label", strings(&["yes", "no", "no", "yes", "yes", "no"])),
        ])
        .expect("raw frame")
    }

    #[test]
    fn drops_rows_with_missing_marker() {
        let data = ProcessedData::new(&spec(), &raw()).expect("processed");
        assert_eq!(data.frame(Tag::Original).unwrap().len(), 5);
    }

    #[test]
    fn numerical_tag_one_hot_encodes_categoricals() {
        let data = ProcessedData::new(&spec(), &raw()).expect("processed");
        let frame = data.frame(Tag::Numerical).unwrap();
        assert!(!frame.has_column("job"));
        assert_eq!(
            frame.column("job_b").unwrap(),
            strings(&["0", "1", "0", "0", "1"]).as_slice()
        );
        assert_eq!(
            frame.column("race").unwrap(),
            strings(&["White", "Black", "White", "Black", "White"]).as_slice()
        );
    }

    #[test]
    fn binsensitive_tags_map_privileged_and_positive_to_one() {
        let data = ProcessedData::new(&spec(), &raw()).expect("processed");
        let frame = data.frame(Tag::CategoricalBinsensitive).unwrap();
        assert_eq!(
            frame.column("sex").unwrap(),
            strings(&["1", "0", "0", "1", "1"]).as_slice()
        );
        assert_eq!(
            frame.column("label").unwrap(),
            strings(&["1", "0", "0", "1", "1"]).as_slice()
        );
        assert_eq!(
            frame.column("race-sex").unwrap(),
            strings(&["1-1", "0-0", "1-0", "0-1", "1-1"]).as_slice()
        );
    }

    #[test]
    fn sensitive_values_are_sorted_and_include_joint() {
        let data = ProcessedData::new(&spec(), &raw()).expect("processed");
        let values = data.sensitive_values(Tag::Original).expect("values");
        assert_eq!(values["race"], strings(&["Black", "White"]));
        assert_eq!(
            values["race-sex"],
            strings(&["Black-Female", "Black-Male", "White-Female", "White-Male"])
        );
    }

    #[test]
    fn splits_share_partition_across_tags_and_are_seeded() {
        let data = ProcessedData::new(&spec(), &raw()).expect("processed");
        let options = SplitOptions {
            seed: 7,
            test_fraction: 0.4,
        };
        let splits = data.create_train_test_splits(3, options).expect("splits");
        let again = data.create_train_test_splits(3, options).expect("splits");

        assert_eq!(splits.num_trials(), 3);
        for trial in 0..3 {
            let original = splits.get(Tag::Original, trial).unwrap();
            let binary = splits.get(Tag::CategoricalBinsensitive, trial).unwrap();
            assert_eq!(original.test.len(), 2);
            assert_eq!(original.train.len(), 3);
            assert_eq!(original.test.column("job"), binary.test.column("job"));
            assert_eq!(
                original.test,
                again.get(Tag::Original, trial).unwrap().test
            );
        }
    }

    #[test]
    fn missing_sensitive_column_is_reported() {
        let mut dataset = spec();
        dataset.sensitive_attributes.push("age".to_string());
        let err = ProcessedData::new(&dataset, &raw()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "age"));
    }
}
