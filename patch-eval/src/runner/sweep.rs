//! Sequential sweep over every valid (case, ground-truth type) pair

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analysis::Tally;
use crate::corpus::CaseId;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{format_score, CaseEvaluator, Evaluation, GroundTruthType};

/// A pair that could not be evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFailure {
    pub case: CaseId,
    pub gt_type: GroundTruthType,
    pub error: String,
}

/// Everything a finished sweep produced
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub tally: Tally,
    pub evaluations: Vec<Evaluation>,
    /// Always empty unless the sweep runs with `keep_going`
    pub failures: Vec<CaseFailure>,
}

impl SweepOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives the evaluator over the corpus, one analyzer run at a time
pub struct Sweep {
    evaluator: CaseEvaluator,
    keep_going: bool,
    progress: Arc<dyn ProgressCallback>,
}

impl Sweep {
    pub fn new(evaluator: CaseEvaluator) -> Self {
        Self {
            evaluator,
            keep_going: false,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Record per-case failures and continue instead of aborting
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn evaluator(&self) -> &CaseEvaluator {
        &self.evaluator
    }

    /// Pairs in sweep order: ascending case, prepatch before postpatch
    pub fn pairs(&self) -> Vec<(CaseId, GroundTruthType)> {
        self.evaluator
            .corpus()
            .all_valid_cases()
            .into_iter()
            .flat_map(|case| GroundTruthType::all().into_iter().map(move |gt| (case, gt)))
            .collect()
    }

    /// Evaluate every pair and accumulate outcomes per partition.
    ///
    /// Without `keep_going` the first failing pair aborts the sweep and no
    /// tally is returned.
    pub async fn run(&self) -> EvalResult<SweepOutcome> {
        let pairs = self.pairs();
        let total = pairs.len();
        let mut tally = Tally::new();
        let mut evaluations = Vec::with_capacity(total);
        let mut failures = Vec::new();

        tracing::info!("Sweeping {} pairs with {}", total, self.evaluator.analyzer_name());

        for (i, (case, gt_type)) in pairs.into_iter().enumerate() {
            self.progress.on_case_start(case, gt_type);

            match self.evaluator.evaluate(case, gt_type).await {
                Ok(evaluation) => {
                    tally.record(evaluation.partition, evaluation.outcome);
                    self.progress.on_case_complete(&evaluation);
                    evaluations.push(evaluation);
                }
                Err(e) if self.keep_going => {
                    tracing::error!("#{} {} failed: {}", case, gt_type, e);
                    self.progress.on_case_failed(case, gt_type, &e);
                    failures.push(CaseFailure {
                        case,
                        gt_type,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!("#{} {} failed, aborting sweep: {}", case, gt_type, e);
                    self.progress.on_case_failed(case, gt_type, &e);
                    return Err(e);
                }
            }

            self.progress.on_progress(i + 1, total);
        }

        if !failures.is_empty() {
            tracing::warn!("{} of {} pairs failed", failures.len(), total);
        }

        Ok(SweepOutcome {
            tally,
            evaluations,
            failures,
        })
    }
}

/// Progress callback for tracking a sweep
pub trait ProgressCallback: Send + Sync {
    fn on_case_start(&self, case: CaseId, gt_type: GroundTruthType);
    fn on_case_complete(&self, evaluation: &Evaluation);
    fn on_case_failed(&self, case: CaseId, gt_type: GroundTruthType, error: &EvalError);
    fn on_progress(&self, completed: usize, total: usize);
}

/// Default no-op progress callback
pub struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_case_start(&self, _case: CaseId, _gt_type: GroundTruthType) {}
    fn on_case_complete(&self, _evaluation: &Evaluation) {}
    fn on_case_failed(&self, _case: CaseId, _gt_type: GroundTruthType, _error: &EvalError) {}
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Prints `#<case> <gt_type> <score>` for every evaluated pair
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_case_start(&self, case: CaseId, gt_type: GroundTruthType) {
        tracing::info!("Running test {} {}", case, gt_type);
    }

    fn on_case_complete(&self, evaluation: &Evaluation) {
        println!("#{} {} {}", evaluation.case, evaluation.gt_type, format_score(evaluation.raw_score));
    }

    fn on_case_failed(&self, case: CaseId, gt_type: GroundTruthType, error: &EvalError) {
        eprintln!("#{} {} FAILED: {}", case, gt_type, error);
    }

    fn on_progress(&self, completed: usize, total: usize) {
        tracing::debug!("Progress: {}/{} pairs", completed, total);
    }
}
