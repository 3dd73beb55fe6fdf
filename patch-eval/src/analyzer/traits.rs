//! Analyzer trait definition

use async_trait::async_trait;

use crate::corpus::CaseId;
use crate::error::EvalResult;
use crate::evaluator::GroundTruthType;

/// Capability to score one (case, ground-truth type) pair.
///
/// Implementations return the raw score as reported; NaN handling and range
/// checks happen in the evaluator.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Run the analysis and return its raw confidence score
    async fn analyze(&self, case: CaseId, gt_type: GroundTruthType) -> EvalResult<f64>;
}
