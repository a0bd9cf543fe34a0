use crate::base::BaseMetric;
use crate::errors::{MetricError, Result};
use crate::input::TrialInput;
use crate::value::{MetricValue, Preference};

/// Any evaluable metric: a base metric or one of its compositions.
#[derive(Debug, Clone, PartialEq)]
pub enum Metric {
    Base(BaseMetric),
    Filtered(FilteredMetric),
    Ratio(RatioMetric),
    Average(AverageMetric),
}

impl Metric {
    pub fn name(&self) -> &str {
        match self {
            Metric::Base(metric) => metric.name(),
            Metric::Filtered(metric) => metric.name(),
            Metric::Ratio(metric) => metric.name(),
            Metric::Average(metric) => metric.name(),
        }
    }

    pub fn calc(&self, input: &TrialInput<'_>) -> Result<MetricValue> {
        match self {
            Metric::Base(metric) => metric.calc(input),
            Metric::Filtered(metric) => metric.calc(input),
            Metric::Ratio(metric) => metric.calc(input),
            Metric::Average(metric) => metric.calc(input),
        }
    }

    pub fn preference(&self) -> Preference {
        match self {
            Metric::Base(metric) => metric.preference(),
            Metric::Filtered(metric) => metric.base.preference(),
            Metric::Ratio(_) => Preference::CloserToOne,
            Metric::Average(metric) => metric.preference,
        }
    }

    pub fn is_better_than(&self, a: MetricValue, b: MetricValue) -> bool {
        self.preference().is_better_than(a, b)
    }
}

impl From<BaseMetric> for Metric {
    fn from(metric: BaseMetric) -> Self {
        Metric::Base(metric)
    }
}

impl From<FilteredMetric> for Metric {
    fn from(metric: FilteredMetric) -> Self {
        Metric::Filtered(metric)
    }
}

impl From<RatioMetric> for Metric {
    fn from(metric: RatioMetric) -> Self {
        Metric::Ratio(metric)
    }
}

impl From<AverageMetric> for Metric {
    fn from(metric: AverageMetric) -> Self {
        Metric::Average(metric)
    }
}

/// Attribute/value pair selecting the rows a [`FilteredMetric`] sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveFilter {
    pub attribute: String,
    pub value: String,
}

/// A base metric restricted to the rows of one sensitive group.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredMetric {
    base: BaseMetric,
    filter: Option<SensitiveFilter>,
    name: String,
}

impl FilteredMetric {
    /// An unfiltered instance; [`FilteredMetric::set_sensitive_to_filter`]
    /// must be called before evaluation.
    pub fn new(base: BaseMetric) -> Self {
        Self {
            base,
            filter: None,
            name: base.name().to_string(),
        }
    }

    pub fn with_filter(
        base: BaseMetric,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let attribute = attribute.into();
        let value = value.into();
        Self {
            base,
            name: filtered_name(base, &attribute, &value),
            filter: Some(SensitiveFilter { attribute, value }),
        }
    }

    /// Fix the group this metric is computed for. Allowed once.
    pub fn set_sensitive_to_filter(
        &mut self,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        if let Some(existing) = &self.filter {
            return Err(MetricError::FilterAlreadySet {
                metric: self.name.clone(),
                attribute: existing.attribute.clone(),
                value: existing.value.clone(),
            });
        }
        let attribute = attribute.into();
        let value = value.into();
        self.name = filtered_name(self.base, &attribute, &value);
        self.filter = Some(SensitiveFilter { attribute, value });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> BaseMetric {
        self.base
    }

    pub fn filter(&self) -> Option<&SensitiveFilter> {
        self.filter.as_ref()
    }

    /// Evaluate the base metric over the matching rows only, by index. An
    /// empty selection is passed through; the base metric turns it into `Na`.
    pub fn calc(&self, input: &TrialInput<'_>) -> Result<MetricValue> {
        let filter = self.filter.as_ref().ok_or_else(|| MetricError::FilterUnset {
            metric: self.name.clone(),
        })?;
        input.check_lengths()?;

        let column = input.sensitive_column(&filter.attribute)?;
        let rows = input
            .rows()
            .filter(|row| column[*row] == filter.value)
            .collect::<Vec<_>>();
        self.base.calc(&input.select(&rows))
    }
}

fn filtered_name(base: BaseMetric, attribute: &str, value: &str) -> String {
    format!("{value}-{attribute}-{}", base.name())
}

/// Quotient of two metrics evaluated over the same trial inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioMetric {
    numerator: Box<Metric>,
    denominator: Box<Metric>,
    name: String,
}

impl RatioMetric {
    pub fn new(numerator: impl Into<Metric>, denominator: impl Into<Metric>) -> Self {
        let numerator = numerator.into();
        let denominator = denominator.into();
        let name = format!("{} / {}", numerator.name(), denominator.name());
        Self {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn numerator(&self) -> &Metric {
        &self.numerator
    }

    pub fn denominator(&self) -> &Metric {
        &self.denominator
    }

    /// `Na` if either side is `Na` or the denominator is exactly zero.
    pub fn calc(&self, input: &TrialInput<'_>) -> Result<MetricValue> {
        let numerator = self.numerator.calc(input)?;
        let denominator = self.denominator.calc(input)?;
        Ok(match (numerator, denominator) {
            (MetricValue::Value(num), MetricValue::Value(den)) => MetricValue::ratio(num, den),
            _ => MetricValue::Na,
        })
    }

    pub fn is_better_than(&self, a: MetricValue, b: MetricValue) -> bool {
        Preference::CloserToOne.is_better_than(a, b)
    }
}

/// Mean of an ordered group of metrics, ignoring `Na` members.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageMetric {
    members: Vec<Metric>,
    name: String,
    preference: Preference,
}

impl AverageMetric {
    /// The average ranks values the way its first member does.
    pub fn new(name: impl Into<String>, members: Vec<Metric>) -> Self {
        let preference = members
            .first()
            .map(Metric::preference)
            .unwrap_or(Preference::HigherIsBetter);
        Self {
            members,
            name: name.into(),
            preference,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Metric] {
        &self.members
    }

    /// Sums in member order; `Na` when no member produced a number.
    pub fn calc(&self, input: &TrialInput<'_>) -> Result<MetricValue> {
        let mut total = 0.0;
        let mut count = 0usize;
        for member in &self.members {
            if let MetricValue::Value(value) = member.calc(input)? {
                total += value;
                count += 1;
            }
        }
        Ok(if count == 0 {
            MetricValue::Na
        } else {
            MetricValue::Value(total / count as f64)
        })
    }

    pub fn is_better_than(&self, a: MetricValue, b: MetricValue) -> bool {
        self.preference.is_better_than(a, b)
    }
}
