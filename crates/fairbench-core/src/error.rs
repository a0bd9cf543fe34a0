use thiserror::Error;

/// Core error type shared across fairbench crates.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    /// A column required by the dataset definition is absent.
    #[error("missing column '{column}' in {context}")]
    MissingColumn { column: String, context: String },
    /// Frame construction violated the equal-length invariant.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    /// The benchmark or dataset configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A data tag was requested that the processed data does not carry.
    #[error("unknown tag: {0}")]
    UnknownTag(String),
}

/// Convenience alias for results returned by fairbench crates.
pub type Result<T> = std::result::Result<T, Error>;
