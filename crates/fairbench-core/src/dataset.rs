use std::fmt;
use std::path::Path;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::Frame;

/// Value written for the privileged / positive side of a binarized column.
pub const BINARY_TRUE: &str = "1";
/// Value written for every other value of a binarized column.
pub const BINARY_FALSE: &str = "0";

/// Data representation variant an algorithm can consume.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Tag {
    /// Cleaned raw values.
    Original,
    /// Categorical features one-hot encoded.
    Numerical,
    /// One-hot encoded, sensitive attributes and class mapped to `1`/`0`.
    NumericalBinsensitive,
    /// Raw categorical values, sensitive attributes and class mapped to `1`/`0`.
    CategoricalBinsensitive,
}

impl Tag {
    pub const ALL: [Tag; 4] = [
        Tag::Original,
        Tag::Numerical,
        Tag::NumericalBinsensitive,
        Tag::CategoricalBinsensitive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Original => "original",
            Tag::Numerical => "numerical",
            Tag::NumericalBinsensitive => "numerical-binsensitive",
            Tag::CategoricalBinsensitive => "categorical-binsensitive",
        }
    }

    pub fn is_binsensitive(&self) -> bool {
        matches!(
            self,
            Tag::NumericalBinsensitive | Tag::CategoricalBinsensitive
        )
    }

    pub fn is_numerical(&self) -> bool {
        matches!(self, Tag::Numerical | Tag::NumericalBinsensitive)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == value)
            .ok_or_else(|| Error::UnknownTag(value.to_string()))
    }
}

/// Contract every benchmark dataset fulfils.
///
/// Implementors describe the raw file and its fairness-relevant columns; the
/// provided methods derive the joint attribute and the per-tag views of the
/// privileged and positive values.
pub trait Dataset {
    fn dataset_name(&self) -> &str;

    fn class_attribute(&self) -> &str;

    /// Positive class label as it appears in the raw file.
    fn positive_class(&self) -> &str;

    fn sensitive_attributes(&self) -> &[String];

    /// Privileged value per sensitive attribute, positionally aligned.
    fn privileged_class_names(&self) -> &[String];

    /// Features expanded to one-hot columns for numerical tags. Never
    /// includes sensitive attributes or the class.
    fn categorical_features(&self) -> &[String];

    /// Raw columns to keep; empty keeps every column.
    fn features_to_keep(&self) -> &[String];

    fn raw_filename(&self) -> &str;

    fn missing_marker(&self) -> &str {
        "?"
    }

    /// Sensitive attributes followed by the joint attribute when there is more than one.
    fn sensitive_attributes_with_joint(&self) -> Vec<String> {
        let attrs = self.sensitive_attributes();
        let mut result = attrs.to_vec();
        if attrs.len() > 1 {
            result.push(attrs.join("-"));
        }
        result
    }

    /// Privileged values as they appear under `tag`.
    fn privileged_class_names_for(&self, tag: Tag) -> Vec<String> {
        if tag.is_binsensitive() {
            vec![BINARY_TRUE.to_string(); self.privileged_class_names().len()]
        } else {
            self.privileged_class_names().to_vec()
        }
    }

    /// Privileged values under `tag`, plus the joint privileged value.
    ///
    /// The joint value is only produced when every sensitive attribute has a
    /// privileged value; otherwise the list stays short and metric expansion
    /// reports the attribute that lacks one.
    fn privileged_class_names_with_joint(&self, tag: Tag) -> Vec<String> {
        let mut names = self.privileged_class_names_for(tag);
        let attrs = self.sensitive_attributes();
        if attrs.len() > 1 && names.len() >= attrs.len() {
            let joint = names[..attrs.len()].join("-");
            names.truncate(attrs.len());
            names.push(joint);
        }
        names
    }

    fn positive_class_val(&self, tag: Tag) -> String {
        if tag.is_binsensitive() {
            BINARY_TRUE.to_string()
        } else {
            self.positive_class().to_string()
        }
    }

    fn results_filename(&self, sensitive: &str, tag: Tag) -> String {
        format!("{}_{}_{}.csv", self.dataset_name(), sensitive, tag)
    }

    fn load_raw(&self, data_dir: &Path) -> Result<Frame> {
        Frame::read_csv(&data_dir.join(self.raw_filename()))
    }
}

/// Dataset described declaratively in the benchmark config.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DatasetSpec {
    /// Stub used for result file names and CLI selection.
    pub name: String,
    /// Raw CSV file, relative to the config's data directory.
    pub raw_file: String,
    pub class_attribute: String,
    pub positive_class: String,
    pub sensitive_attributes: Vec<String>,
    /// Privileged value for each entry of `sensitive_attributes`.
    pub privileged_classes: Vec<String>,
    #[serde(default)]
    pub categorical_features: Vec<String>,
    #[serde(default)]
    pub features_to_keep: Vec<String>,
    #[serde(default = "default_missing_marker")]
    pub missing_marker: String,
}

fn default_missing_marker() -> String {
    "?".to_string()
}

impl DatasetSpec {
    /// Structural checks that do not need the raw data.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidConfig("dataset name is empty".to_string()));
        }
        if self.sensitive_attributes.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "dataset '{}' declares no sensitive attributes",
                self.name
            )));
        }
        if self.privileged_classes.len() != self.sensitive_attributes.len() {
            return Err(Error::InvalidConfig(format!(
                "dataset '{}' lists {} privileged classes for {} sensitive attributes",
                self.name,
                self.privileged_classes.len(),
                self.sensitive_attributes.len()
            )));
        }
        if !self.features_to_keep.is_empty() {
            let required = self
                .sensitive_attributes
                .iter()
                .chain(std::iter::once(&self.class_attribute));
            for column in required {
                if !self.features_to_keep.contains(column) {
                    return Err(Error::InvalidConfig(format!(
                        "dataset '{}' drops required column '{}'",
                        self.name, column
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Dataset for DatasetSpec {
    fn dataset_name(&self) -> &str {
        &self.name
    }

    fn class_attribute(&self) -> &str {
        &self.class_attribute
    }

    fn positive_class(&self) -> &str {
        &self.positive_class
    }

    fn sensitive_attributes(&self) -> &[String] {
        &self.sensitive_attributes
    }

    fn privileged_class_names(&self) -> &[String] {
        &self.privileged_classes
    }

    fn categorical_features(&self) -> &[String] {
        &self.categorical_features
    }

    fn features_to_keep(&self) -> &[String] {
        &self.features_to_keep
    }

    fn raw_filename(&self) -> &str {
        &self.raw_file
    }

    fn missing_marker(&self) -> &str {
        &self.missing_marker
    }
}
