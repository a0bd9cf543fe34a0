//! Core contracts for fairbench.
//!
//! This crate defines the in-memory frame model, the dataset contract and
//! its TOML form, the per-tag processed views of a dataset, and the seeded
//! train/test splits every benchmark trial consumes.

pub mod config;
pub mod dataset;
pub mod error;
pub mod frame;
pub mod processed;

pub use config::{BenchConfig, MetricsConfig, NUM_TRIALS_DEFAULT};
pub use dataset::{BINARY_FALSE, BINARY_TRUE, Dataset, DatasetSpec, Tag};
pub use error::{Error, Result};
pub use frame::Frame;
pub use processed::{ProcessedData, SplitOptions, TrainTestSplit, TrainTestSplits};
