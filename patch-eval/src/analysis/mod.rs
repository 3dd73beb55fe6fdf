//! Confusion-matrix accumulation and summary metrics

pub mod metrics;
pub mod tally;

pub use metrics::{accuracy, f1, precision, recall, ConfusionMatrix};
pub use tally::{PartitionSummary, Tally};
