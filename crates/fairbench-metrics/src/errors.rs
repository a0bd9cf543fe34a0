use thiserror::Error;

/// Errors emitted while building or evaluating metrics.
#[derive(Debug, Error)]
pub enum MetricError {
    /// A declared sensitive attribute has no privileged value. Expansion
    /// stops here; skipping would shift every later column.
    #[error("no privileged value configured for sensitive attribute '{attribute}'")]
    MissingPrivileged { attribute: String },
    #[error("no observed values for sensitive attribute '{attribute}'")]
    MissingSensitiveValues { attribute: String },
    #[error("sensitive attribute '{attribute}' missing from trial inputs")]
    MissingSensitiveColumn { attribute: String },
    #[error("metric '{metric}' evaluated before its sensitive filter was set")]
    FilterUnset { metric: String },
    #[error("metric '{metric}' already filters on {attribute}={value}")]
    FilterAlreadySet {
        metric: String,
        attribute: String,
        value: String,
    },
    #[error("length mismatch: {0}")]
    LengthMismatch(String),
    #[error("invalid metric value: {0}")]
    InvalidValue(String),
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
}

/// Result type for metric operations.
pub type Result<T> = std::result::Result<T, MetricError>;
