use crate::base::BaseMetric;
use crate::errors::Result;
use crate::input::TrialInput;
use crate::metric::Metric;
use crate::sensitive::{SensitiveCatalog, SensitiveMetric};
use crate::value::MetricValue;

/// Leading columns of every results file.
pub const HEADER_PREFIX: [&str; 2] = ["algorithm", "params"];

/// How a base metric enters the results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSpec {
    /// Evaluated once over the whole test split.
    Plain(BaseMetric),
    /// Expanded per sensitive group with ratios and averages.
    Sensitive(BaseMetric),
}

impl MetricSpec {
    pub fn expand(&self, catalog: &SensitiveCatalog) -> Result<Vec<Metric>> {
        match self {
            MetricSpec::Plain(base) => Ok(vec![Metric::Base(*base)]),
            MetricSpec::Sensitive(base) => SensitiveMetric::new(*base).expand_per_dataset(catalog),
        }
    }
}

/// Ordered set of metric specs resolved per dataset, attribute and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRegistry {
    specs: Vec<MetricSpec>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MetricRegistry {
    pub fn new(specs: Vec<MetricSpec>) -> Self {
        Self { specs }
    }

    /// Accuracy and fairness metrics reported by default.
    pub fn standard() -> Self {
        let plain = [
            BaseMetric::Accuracy,
            BaseMetric::Tnr,
            BaseMetric::Tpr,
            BaseMetric::Bcr,
            BaseMetric::Mcc,
            BaseMetric::DisparateImpact,
            BaseMetric::DisparateImpactAvgAll,
            BaseMetric::CaldersVerwer,
        ];
        let sensitive = [
            BaseMetric::Accuracy,
            BaseMetric::Tpr,
            BaseMetric::Tnr,
            BaseMetric::Fpr,
            BaseMetric::Fnr,
            BaseMetric::CalibrationPos,
            BaseMetric::CalibrationNeg,
            BaseMetric::PositiveRate,
        ];
        Self::from_bases(&plain, &sensitive)
    }

    /// Plain metrics first, then the sensitive expansions.
    pub fn from_bases(plain: &[BaseMetric], sensitive: &[BaseMetric]) -> Self {
        let specs = plain
            .iter()
            .copied()
            .map(MetricSpec::Plain)
            .chain(sensitive.iter().copied().map(MetricSpec::Sensitive))
            .collect();
        Self { specs }
    }

    pub fn specs(&self) -> &[MetricSpec] {
        &self.specs
    }

    /// Build the concrete metric list for one catalog. A configuration error
    /// in any spec aborts the whole resolution.
    pub fn resolve(&self, catalog: &SensitiveCatalog) -> Result<MetricSet> {
        let mut metrics = Vec::new();
        for spec in &self.specs {
            metrics.extend(spec.expand(catalog)?);
        }
        Ok(MetricSet { metrics })
    }
}

/// Concrete metrics for one (dataset, attribute, tag). The same order
/// drives evaluation and the results header.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSet {
    metrics: Vec<Metric>,
}

impl MetricSet {
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn names(&self) -> Vec<&str> {
        self.metrics.iter().map(Metric::name).collect()
    }

    /// `algorithm,params,<metric names>`.
    pub fn header(&self) -> Vec<String> {
        HEADER_PREFIX
            .iter()
            .map(|column| column.to_string())
            .chain(self.metrics.iter().map(|metric| metric.name().to_string()))
            .collect()
    }

    /// One value per metric, in header order.
    pub fn evaluate(&self, input: &TrialInput<'_>) -> Result<Vec<MetricValue>> {
        self.metrics.iter().map(|metric| metric.calc(input)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn plain_metrics_precede_expansions() {
        let mut values = BTreeMap::new();
        values.insert("sex".to_string(), strings(&["Female", "Male"]));
        let catalog = SensitiveCatalog::new(strings(&["sex"]), strings(&["Male"]), values);

        let registry = MetricRegistry::from_bases(&[BaseMetric::Accuracy], &[BaseMetric::Tpr]);
        let set = registry.resolve(&catalog).expect("resolve");
        assert_eq!(
            set.header(),
            vec![
                "algorithm",
                "params",
                "accuracy",
                "Female-sex-TPR",
                "Male-sex-TPR",
                "sex-TPR",
                "Female-sex-TPR / Male-sex-TPR",
                "sex-TPRRatio",
            ]
        );
    }

    #[test]
    fn standard_registry_lists_plain_then_sensitive() {
        let registry = MetricRegistry::standard();
        assert_eq!(registry.specs().len(), 16);
        assert_eq!(registry.specs()[0], MetricSpec::Plain(BaseMetric::Accuracy));
        assert_eq!(registry.specs()[8], MetricSpec::Sensitive(BaseMetric::Accuracy));
    }
}
