//! Per-partition accumulation of outcomes

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::metrics::ConfusionMatrix;
use crate::corpus::Partition;
use crate::error::EvalResult;
use crate::evaluator::OutcomeClass;

/// One confusion matrix per partition, zeroed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    matrices: IndexMap<Partition, ConfusionMatrix>,
}

impl Tally {
    pub fn new() -> Self {
        Self {
            matrices: Partition::all()
                .into_iter()
                .map(|p| (p, ConfusionMatrix::default()))
                .collect(),
        }
    }

    /// Count an outcome under its partition
    pub fn record(&mut self, partition: Partition, outcome: OutcomeClass) {
        self.matrices.entry(partition).or_default().record(outcome);
    }

    /// Snapshot of a partition's counts
    pub fn matrix(&self, partition: Partition) -> ConfusionMatrix {
        self.matrices.get(&partition).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Partition, &ConfusionMatrix)> {
        self.matrices.iter().map(|(p, m)| (*p, m))
    }

    /// Total outcomes recorded across partitions
    pub fn total(&self) -> u64 {
        self.matrices.values().map(ConfusionMatrix::total).sum()
    }

    /// Metrics for every partition; fails on the first undefined metric
    pub fn summarize(&self) -> EvalResult<Vec<PartitionSummary>> {
        self.iter()
            .map(|(p, m)| PartitionSummary::from_matrix(p, m))
            .collect()
    }

    /// Metrics for every partition, leaving undefined ones empty.
    ///
    /// Used for runs that skipped failed pairs, where a partition may have
    /// no recorded outcomes at all.
    pub fn summarize_partial(&self) -> Vec<PartitionSummary> {
        self.iter()
            .map(|(p, m)| PartitionSummary::partial(p, m))
            .collect()
    }
}

impl Default for Tally {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics derived from one partition's counts.
///
/// A metric is `None` only in summaries built with [`PartitionSummary::partial`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub partition: Partition,
    pub counts: ConfusionMatrix,
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
}

impl PartitionSummary {
    pub fn from_matrix(partition: Partition, counts: &ConfusionMatrix) -> EvalResult<Self> {
        Ok(Self {
            partition,
            counts: *counts,
            accuracy: Some(counts.accuracy()?),
            precision: Some(counts.precision()?),
            recall: Some(counts.recall()?),
            f1: Some(counts.f1()?),
        })
    }

    pub fn partial(partition: Partition, counts: &ConfusionMatrix) -> Self {
        Self {
            partition,
            counts: *counts,
            accuracy: counts.accuracy().ok(),
            precision: counts.precision().ok(),
            recall: counts.recall().ok(),
            f1: counts.f1().ok(),
        }
    }

    /// True if every metric is defined
    pub fn is_defined(&self) -> bool {
        [self.accuracy, self.precision, self.recall, self.f1]
            .iter()
            .all(Option::is_some)
    }
}
