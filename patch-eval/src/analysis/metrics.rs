//! Confusion matrix and derived classification metrics

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::evaluator::OutcomeClass;

/// Outcome counts for one partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: u64,
    pub fp: u64,
    pub tn: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

impl ConfusionMatrix {
    pub fn new(tp: u64, fp: u64, tn: u64, fn_: u64) -> Self {
        Self { tp, fp, tn, fn_ }
    }

    /// Count one outcome
    pub fn record(&mut self, outcome: OutcomeClass) {
        match outcome {
            OutcomeClass::TruePositive => self.tp += 1,
            OutcomeClass::FalsePositive => self.fp += 1,
            OutcomeClass::TrueNegative => self.tn += 1,
            OutcomeClass::FalseNegative => self.fn_ += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn accuracy(&self) -> EvalResult<f64> {
        accuracy(self)
    }

    pub fn precision(&self) -> EvalResult<f64> {
        precision(self)
    }

    pub fn recall(&self) -> EvalResult<f64> {
        recall(self)
    }

    pub fn f1(&self) -> EvalResult<f64> {
        f1(self)
    }
}

fn ratio(metric: &'static str, num: u64, den: u64) -> EvalResult<f64> {
    if den == 0 {
        return Err(EvalError::MetricUndefined { metric });
    }
    Ok(num as f64 / den as f64)
}

/// (tp + tn) / total
pub fn accuracy(m: &ConfusionMatrix) -> EvalResult<f64> {
    ratio("accuracy", m.tp + m.tn, m.total())
}

/// tp / (tp + fp)
pub fn precision(m: &ConfusionMatrix) -> EvalResult<f64> {
    ratio("precision", m.tp, m.tp + m.fp)
}

/// tp / (tp + fn)
pub fn recall(m: &ConfusionMatrix) -> EvalResult<f64> {
    ratio("recall", m.tp, m.tp + m.fn_)
}

/// Harmonic mean of precision and recall
pub fn f1(m: &ConfusionMatrix) -> EvalResult<f64> {
    let p = precision(m)?;
    let r = recall(m)?;
    if p + r == 0.0 {
        return Err(EvalError::MetricUndefined { metric: "f1" });
    }
    Ok(2.0 * p * r / (p + r))
}
