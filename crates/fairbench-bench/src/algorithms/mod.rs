//! Baseline classifiers shipped with the benchmark.

mod majority;
mod naive_bayes;

pub use majority::Majority;
pub use naive_bayes::NaiveBayes;

use crate::algorithm::Algorithm;

/// Every built-in algorithm, in reporting order.
pub fn builtin() -> Vec<Box<dyn Algorithm>> {
    vec![Box::new(Majority), Box::new(NaiveBayes)]
}
