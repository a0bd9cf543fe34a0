//! Metric composition engine for fairness benchmarks.
//!
//! Base metrics are scalar functions of one trial's labels and predictions.
//! [`SensitiveMetric`] expands a base metric into per-group filtered
//! metrics, unprivileged/privileged ratios and group averages; the
//! [`MetricRegistry`] turns a fixed list of specs into the ordered metric
//! set (and results header) for one dataset, sensitive attribute and tag.

pub mod base;
pub mod errors;
pub mod input;
pub mod metric;
pub mod registry;
pub mod sensitive;
pub mod value;

pub use base::BaseMetric;
pub use errors::{MetricError, Result};
pub use input::{SensitiveLists, TrialInput};
pub use metric::{AverageMetric, FilteredMetric, Metric, RatioMetric, SensitiveFilter};
pub use registry::{HEADER_PREFIX, MetricRegistry, MetricSet, MetricSpec};
pub use sensitive::{SensitiveCatalog, SensitiveMetric};
pub use value::{MetricValue, Preference};
