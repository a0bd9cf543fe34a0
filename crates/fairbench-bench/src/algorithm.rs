use std::collections::BTreeMap;

use fairbench_core::{Frame, Tag};

use crate::errors::{BenchError, Result};

/// Algorithm parameters, rendered into the `params` column.
pub type Params = BTreeMap<String, String>;

/// Inputs handed to an algorithm for one trial.
///
/// `train` and `test` still carry the sensitive attributes; fairness-aware
/// algorithms may use them, everything else must leave them out of training.
#[derive(Debug, Clone, Copy)]
pub struct AlgorithmInput<'a> {
    pub train: &'a Frame,
    pub test: &'a Frame,
    pub class_attribute: &'a str,
    pub positive: &'a str,
    pub sensitive_attributes: &'a [String],
    pub single_sensitive: &'a str,
    pub privileged: &'a [String],
    pub params: &'a Params,
}

impl AlgorithmInput<'_> {
    /// Columns that are neither the class nor a sensitive attribute.
    pub fn feature_columns(&self) -> Vec<&str> {
        self.train
            .column_names()
            .iter()
            .filter(|name| {
                name.as_str() != self.class_attribute && !self.sensitive_attributes.contains(*name)
            })
            .map(String::as_str)
            .collect()
    }
}

/// A classifier that can be benchmarked.
pub trait Algorithm {
    fn name(&self) -> &str;

    fn supported_tags(&self) -> &[Tag];

    fn default_params(&self) -> Params {
        Params::new()
    }

    /// Train on `input.train` and return one predicted label per test row.
    fn run(&self, input: &AlgorithmInput<'_>) -> Result<Vec<String>>;
}

/// `{key: value, ...}` in key order; `{}` when empty.
pub fn format_params(params: &Params) -> String {
    let body = params
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

/// Read a numeric parameter, falling back to `default` when absent.
pub fn float_param(algorithm: &str, params: &Params, key: &str, default: f64) -> Result<f64> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<f64>().map_err(|_| BenchError::Algorithm {
            algorithm: algorithm.to_string(),
            message: format!("parameter '{key}' is not a number: '{raw}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_render_in_key_order() {
        let mut params = Params::new();
        assert_eq!(format_params(&params), "{}");
        params.insert("eta".to_string(), "30".to_string());
        params.insert("alpha".to_string(), "1".to_string());
        assert_eq!(format_params(&params), "{alpha: 1, eta: 30}");
    }

    #[test]
    fn float_param_rejects_garbage() {
        let mut params = Params::new();
        assert_eq!(float_param("nb", &params, "alpha", 1.0).unwrap(), 1.0);
        params.insert("alpha".to_string(), "lots".to_string());
        assert!(matches!(
            float_param("nb", &params, "alpha", 1.0),
            Err(BenchError::Algorithm { .. })
        ));
    }
}
