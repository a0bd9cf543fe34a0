use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::errors::MetricError;

/// Outcome of a metric: a number, or `Na` when it is not computable.
///
/// `Na` never stands in for zero; composites skip or propagate it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    Na,
}

impl MetricValue {
    /// Wrap a float, turning NaN and infinities into `Na`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            MetricValue::Value(value)
        } else {
            MetricValue::Na
        }
    }

    /// `numerator / denominator`, or `Na` when the denominator is zero.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            MetricValue::Na
        } else {
            Self::from_f64(numerator / denominator)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            MetricValue::Value(value) => Some(value),
            MetricValue::Na => None,
        }
    }

    pub fn is_na(self) -> bool {
        matches!(self, MetricValue::Na)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::from_f64).unwrap_or(MetricValue::Na)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(value) => write!(f, "{value}"),
            MetricValue::Na => f.write_str("NA"),
        }
    }
}

impl FromStr for MetricValue {
    type Err = MetricError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed == "NA" {
            return Ok(MetricValue::Na);
        }
        trimmed
            .parse::<f64>()
            .map(Self::from_f64)
            .map_err(|_| MetricError::InvalidValue(trimmed.to_string()))
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(value) => serializer.serialize_f64(*value),
            MetricValue::Na => serializer.serialize_str("NA"),
        }
    }
}

/// Direction in which a metric's values improve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    HigherIsBetter,
    LowerIsBetter,
    /// Parity metrics: distance to 1.0 should shrink.
    CloserToOne,
}

impl Preference {
    /// Strict preference of `a` over `b`. `Na` loses to every number and
    /// never beats anything.
    pub fn is_better_than(self, a: MetricValue, b: MetricValue) -> bool {
        match (a, b) {
            (MetricValue::Na, _) => false,
            (MetricValue::Value(_), MetricValue::Na) => true,
            (MetricValue::Value(a), MetricValue::Value(b)) => match self {
                Preference::HigherIsBetter => a > b,
                Preference::LowerIsBetter => a < b,
                Preference::CloserToOne => (1.0 - a).abs() < (1.0 - b).abs(),
            },
        }
    }
}
