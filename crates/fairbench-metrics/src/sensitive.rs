use std::collections::BTreeMap;

use crate::base::BaseMetric;
use crate::errors::{MetricError, Result};
use crate::metric::{AverageMetric, FilteredMetric, Metric, RatioMetric};

/// Sensitive attributes of one dataset under one tag: declared order,
/// privileged value per attribute and the observed values of each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveCatalog {
    attributes: Vec<String>,
    privileged: Vec<String>,
    values: BTreeMap<String, Vec<String>>,
}

impl SensitiveCatalog {
    /// `privileged` is aligned with `attributes` by position, so a short
    /// list leaves the trailing attributes without a privileged value.
    pub fn new(
        attributes: Vec<String>,
        privileged: Vec<String>,
        values: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            attributes,
            privileged,
            values,
        }
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn privileged(&self) -> &[String] {
        &self.privileged
    }

    pub fn privileged_for(&self, attribute: &str) -> Result<&str> {
        self.attributes
            .iter()
            .zip(&self.privileged)
            .find(|(candidate, _)| *candidate == attribute)
            .map(|(_, privileged)| privileged.as_str())
            .ok_or_else(|| MetricError::MissingPrivileged {
                attribute: attribute.to_string(),
            })
    }

    pub fn values_for(&self, attribute: &str) -> Result<&[String]> {
        self.values
            .get(attribute)
            .map(Vec::as_slice)
            .ok_or_else(|| MetricError::MissingSensitiveValues {
                attribute: attribute.to_string(),
            })
    }
}

/// Factory expanding one base metric into its per-group family.
///
/// For each attribute `A` and observed value `v` it yields the filtered
/// metric `v-A-base`, a ratio against the privileged group for every
/// unprivileged `v`, and the two averages `A-base` and `A-baseRatio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensitiveMetric {
    base: BaseMetric,
}

impl SensitiveMetric {
    pub fn new(base: BaseMetric) -> Self {
        Self { base }
    }

    pub fn base(&self) -> BaseMetric {
        self.base
    }

    pub fn name(&self) -> &'static str {
        self.base.name()
    }

    /// Expand over every catalog attribute, in declared order.
    pub fn expand_per_dataset(&self, catalog: &SensitiveCatalog) -> Result<Vec<Metric>> {
        let mut metrics = Vec::new();
        for attribute in catalog.attributes() {
            metrics.extend(self.make_metric_objects(attribute, catalog)?);
        }
        Ok(metrics)
    }

    /// One attribute's contribution: filtered metrics, their average, the
    /// ratios, then the ratio average.
    pub fn make_metric_objects(
        &self,
        attribute: &str,
        catalog: &SensitiveCatalog,
    ) -> Result<Vec<Metric>> {
        let privileged = catalog.privileged_for(attribute)?;
        let values = catalog.values_for(attribute)?;

        let mut filtered = Vec::with_capacity(values.len());
        let mut ratios = Vec::new();
        for value in values {
            filtered.push(Metric::from(self.make_sensitive_obj(attribute, value)));
            if value != privileged {
                ratios.push(Metric::from(
                    self.make_ratio_obj(attribute, value, privileged),
                ));
            }
        }

        let average = AverageMetric::new(format!("{attribute}-{}", self.name()), filtered.clone());
        let ratio_average =
            AverageMetric::new(format!("{attribute}-{}Ratio", self.name()), ratios.clone());

        let mut metrics = filtered;
        metrics.push(average.into());
        metrics.extend(ratios);
        metrics.push(ratio_average.into());
        Ok(metrics)
    }

    fn make_sensitive_obj(&self, attribute: &str, value: &str) -> FilteredMetric {
        FilteredMetric::with_filter(self.base, attribute, value)
    }

    /// Unprivileged group over privileged group.
    fn make_ratio_obj(&self, attribute: &str, value: &str, privileged: &str) -> RatioMetric {
        RatioMetric::new(
            self.make_sensitive_obj(attribute, value),
            self.make_sensitive_obj(attribute, privileged),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn catalog() -> SensitiveCatalog {
        let mut values = BTreeMap::new();
        values.insert("race".to_string(), strings(&["White", "Black"]));
        values.insert("sex".to_string(), strings(&["Male", "Female"]));
        SensitiveCatalog::new(
            strings(&["race", "sex"]),
            strings(&["White", "Male"]),
            values,
        )
    }

    #[test]
    fn privileged_lookup_is_positional() {
        let catalog = catalog();
        assert_eq!(catalog.privileged_for("sex").unwrap(), "Male");
        assert!(matches!(
            catalog.privileged_for("age"),
            Err(MetricError::MissingPrivileged { ref attribute }) if attribute == "age"
        ));
    }

    #[test]
    fn single_attribute_contribution_order() {
        let names = SensitiveMetric::new(BaseMetric::Tpr)
            .make_metric_objects("sex", &catalog())
            .expect("expand")
            .iter()
            .map(|metric| metric.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "Male-sex-TPR",
                "Female-sex-TPR",
                "sex-TPR",
                "Female-sex-TPR / Male-sex-TPR",
                "sex-TPRRatio",
            ]
        );
    }

    #[test]
    fn missing_privileged_value_fails_loudly() {
        let mut values = BTreeMap::new();
        values.insert("race".to_string(), strings(&["White", "Black"]));
        values.insert("sex".to_string(), strings(&["Male", "Female"]));
        let catalog = SensitiveCatalog::new(strings(&["race", "sex"]), strings(&["White"]), values);

        let err = SensitiveMetric::new(BaseMetric::Accuracy)
            .expand_per_dataset(&catalog)
            .unwrap_err();
        assert!(matches!(err, MetricError::MissingPrivileged { ref attribute } if attribute == "sex"));
        assert!(err.to_string().contains("'sex'"));
    }

    #[test]
    fn ratio_pairs_unprivileged_over_privileged() {
        let metrics = SensitiveMetric::new(BaseMetric::Accuracy)
            .make_metric_objects("race", &catalog())
            .expect("expand");
        let Metric::Ratio(ratio) = &metrics[3] else {
            panic!("expected ratio at position 3, got {:?}", metrics[3]);
        };
        assert_eq!(ratio.numerator().name(), "Black-race-accuracy");
        assert_eq!(ratio.denominator().name(), "White-race-accuracy");
    }

    #[test]
    fn privileged_value_absent_from_observed_values_still_pairs_ratios() {
        let mut values = BTreeMap::new();
        values.insert("race".to_string(), strings(&["Black", "Asian"]));
        let catalog = SensitiveCatalog::new(strings(&["race"]), strings(&["White"]), values);
        let names = SensitiveMetric::new(BaseMetric::Accuracy)
            .expand_per_dataset(&catalog)
            .expect("expand")
            .iter()
            .map(|metric| metric.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names.len(), 6);
        assert_eq!(names[3], "Black-race-accuracy / White-race-accuracy");
    }
}
