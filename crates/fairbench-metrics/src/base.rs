use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::{MetricError, Result};
use crate::input::TrialInput;
use crate::value::{MetricValue, Preference};

/// Stateless scalar metrics over one trial's predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BaseMetric {
    Accuracy,
    /// True positive rate (recall).
    Tpr,
    /// True negative rate (specificity).
    Tnr,
    Fpr,
    Fnr,
    /// Balanced classification rate: mean of TPR and TNR.
    Bcr,
    /// Balanced error rate: `1 - BCR`.
    Ber,
    /// Matthews correlation coefficient.
    Mcc,
    /// Share of rows predicted positive.
    PositiveRate,
    /// Positive predictive value.
    CalibrationPos,
    /// Negative predictive value.
    CalibrationNeg,
    /// Unprivileged over privileged positive-prediction rate.
    DisparateImpact,
    /// Disparate impact averaged over every unprivileged value.
    DisparateImpactAvgAll,
    /// Calders-Verwer score: `1 - (P(+|priv) - P(+|unpriv))`.
    CaldersVerwer,
}

impl BaseMetric {
    pub const ALL: [BaseMetric; 14] = [
        BaseMetric::Accuracy,
        BaseMetric::Tpr,
        BaseMetric::Tnr,
        BaseMetric::Fpr,
        BaseMetric::Fnr,
        BaseMetric::Bcr,
        BaseMetric::Ber,
        BaseMetric::Mcc,
        BaseMetric::PositiveRate,
        BaseMetric::CalibrationPos,
        BaseMetric::CalibrationNeg,
        BaseMetric::DisparateImpact,
        BaseMetric::DisparateImpactAvgAll,
        BaseMetric::CaldersVerwer,
    ];

    /// Column name used in results files.
    pub fn name(&self) -> &'static str {
        match self {
            BaseMetric::Accuracy => "accuracy",
            BaseMetric::Tpr => "TPR",
            BaseMetric::Tnr => "TNR",
            BaseMetric::Fpr => "FPR",
            BaseMetric::Fnr => "FNR",
            BaseMetric::Bcr => "BCR",
            BaseMetric::Ber => "BER",
            BaseMetric::Mcc => "MCC",
            BaseMetric::PositiveRate => "PR",
            BaseMetric::CalibrationPos => "calibration+",
            BaseMetric::CalibrationNeg => "calibration-",
            BaseMetric::DisparateImpact => "DIbinary",
            BaseMetric::DisparateImpactAvgAll => "DIavgall",
            BaseMetric::CaldersVerwer => "CV",
        }
    }

    pub fn preference(&self) -> Preference {
        match self {
            BaseMetric::Fpr | BaseMetric::Fnr | BaseMetric::Ber => Preference::LowerIsBetter,
            BaseMetric::DisparateImpact
            | BaseMetric::DisparateImpactAvgAll
            | BaseMetric::CaldersVerwer => Preference::CloserToOne,
            _ => Preference::HigherIsBetter,
        }
    }

    pub fn is_better_than(&self, a: MetricValue, b: MetricValue) -> bool {
        self.preference().is_better_than(a, b)
    }

    /// Evaluate over `input`. Empty groups yield `Na`, never an error.
    pub fn calc(&self, input: &TrialInput<'_>) -> Result<MetricValue> {
        input.check_lengths()?;
        let counts = Confusion::count(input);

        let value = match self {
            BaseMetric::Accuracy => MetricValue::ratio(counts.correct(), counts.total()),
            BaseMetric::Tpr => MetricValue::ratio(counts.tp, counts.tp + counts.fn_),
            BaseMetric::Tnr => MetricValue::ratio(counts.tn, counts.tn + counts.fp),
            BaseMetric::Fpr => MetricValue::ratio(counts.fp, counts.fp + counts.tn),
            BaseMetric::Fnr => MetricValue::ratio(counts.fn_, counts.fn_ + counts.tp),
            BaseMetric::Bcr => counts.bcr(),
            BaseMetric::Ber => match counts.bcr() {
                MetricValue::Value(bcr) => MetricValue::Value(1.0 - bcr),
                MetricValue::Na => MetricValue::Na,
            },
            BaseMetric::Mcc => counts.mcc(),
            BaseMetric::PositiveRate => {
                MetricValue::ratio(counts.tp + counts.fp, counts.total())
            }
            BaseMetric::CalibrationPos => MetricValue::ratio(counts.tp, counts.tp + counts.fp),
            BaseMetric::CalibrationNeg => MetricValue::ratio(counts.tn, counts.tn + counts.fn_),
            BaseMetric::DisparateImpact => {
                let groups = GroupRates::split(input)?;
                disparate_impact(groups.unprivileged, groups.privileged)
            }
            BaseMetric::DisparateImpactAvgAll => disparate_impact_avg_all(input)?,
            BaseMetric::CaldersVerwer => {
                let groups = GroupRates::split(input)?;
                match (groups.privileged.rate(), groups.unprivileged.rate()) {
                    (Some(privileged), Some(unprivileged)) => {
                        MetricValue::Value(1.0 - (privileged - unprivileged))
                    }
                    _ => MetricValue::Na,
                }
            }
        };

        Ok(value)
    }
}

impl fmt::Display for BaseMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseMetric {
    type Err = MetricError;

    fn from_str(value: &str) -> Result<Self> {
        BaseMetric::ALL
            .into_iter()
            .find(|metric| metric.name().eq_ignore_ascii_case(value))
            .ok_or_else(|| MetricError::UnknownMetric(value.to_string()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Confusion {
    tp: f64,
    fp: f64,
    tn: f64,
    fn_: f64,
}

impl Confusion {
    fn count(input: &TrialInput<'_>) -> Self {
        let mut counts = Confusion::default();
        for row in input.rows() {
            let truth = input.actual[row] == input.positive;
            let guess = input.predicted[row] == input.positive;
            match (truth, guess) {
                (true, true) => counts.tp += 1.0,
                (false, true) => counts.fp += 1.0,
                (false, false) => counts.tn += 1.0,
                (true, false) => counts.fn_ += 1.0,
            }
        }
        counts
    }

    fn total(&self) -> f64 {
        self.tp + self.fp + self.tn + self.fn_
    }

    fn correct(&self) -> f64 {
        self.tp + self.tn
    }

    fn bcr(&self) -> MetricValue {
        let tpr = MetricValue::ratio(self.tp, self.tp + self.fn_);
        let tnr = MetricValue::ratio(self.tn, self.tn + self.fp);
        match (tpr, tnr) {
            (MetricValue::Value(tpr), MetricValue::Value(tnr)) => {
                MetricValue::Value((tpr + tnr) / 2.0)
            }
            _ => MetricValue::Na,
        }
    }

    fn mcc(&self) -> MetricValue {
        let denominator = ((self.tp + self.fp)
            * (self.tp + self.fn_)
            * (self.tn + self.fp)
            * (self.tn + self.fn_))
            .sqrt();
        MetricValue::ratio(self.tp * self.tn - self.fp * self.fn_, denominator)
    }
}

/// Positive-prediction tally for one group of rows.
#[derive(Debug, Default, Clone, Copy)]
struct PositiveTally {
    positive: usize,
    total: usize,
}

impl PositiveTally {
    fn record(&mut self, predicted_positive: bool) {
        self.total += 1;
        if predicted_positive {
            self.positive += 1;
        }
    }

    fn rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.positive as f64 / self.total as f64)
    }
}

struct GroupRates {
    privileged: PositiveTally,
    unprivileged: PositiveTally,
}

impl GroupRates {
    /// Tally predictions of the privileged and unprivileged rows of the
    /// attribute the trial is about.
    fn split(input: &TrialInput<'_>) -> Result<Self> {
        let column = input.sensitive_column(input.single_sensitive)?;
        let mut rates = GroupRates {
            privileged: PositiveTally::default(),
            unprivileged: PositiveTally::default(),
        };
        for row in input.rows() {
            let predicted_positive = input.predicted[row] == input.positive;
            if input.is_privileged(&column[row]) {
                rates.privileged.record(predicted_positive);
            } else {
                rates.unprivileged.record(predicted_positive);
            }
        }
        Ok(rates)
    }
}

/// Ratio of positive rates. Both rates zero counts as parity.
fn disparate_impact(unprivileged: PositiveTally, privileged: PositiveTally) -> MetricValue {
    match (unprivileged.rate(), privileged.rate()) {
        (Some(unprivileged), Some(privileged)) => {
            if unprivileged == 0.0 && privileged == 0.0 {
                MetricValue::Value(1.0)
            } else {
                MetricValue::ratio(unprivileged, privileged)
            }
        }
        _ => MetricValue::Na,
    }
}

fn disparate_impact_avg_all(input: &TrialInput<'_>) -> Result<MetricValue> {
    let column = input.sensitive_column(input.single_sensitive)?;

    let mut privileged = PositiveTally::default();
    let unprivileged_values = input
        .rows()
        .map(|row| column[row].as_str())
        .filter(|value| !input.is_privileged(value))
        .collect::<BTreeSet<_>>();
    for row in input.rows() {
        if input.is_privileged(&column[row]) {
            privileged.record(input.predicted[row] == input.positive);
        }
    }

    let mut total = 0.0;
    let mut count = 0usize;
    for group in unprivileged_values {
        let mut tally = PositiveTally::default();
        for row in input.rows() {
            if column[row] == group {
                tally.record(input.predicted[row] == input.positive);
            }
        }
        if let MetricValue::Value(value) = disparate_impact(tally, privileged) {
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
