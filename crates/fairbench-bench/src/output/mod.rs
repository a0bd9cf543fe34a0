//! Results file writers.

pub mod csv;

pub use self::csv::ResultsWriter;
