//! Error types shared by the evaluation pipeline

use crate::corpus::CaseId;
use crate::evaluator::GroundTruthType;

/// Error types for corpus, analyzer, and metric operations
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Case {case} is outside the corpus or excluded")]
    Domain { case: CaseId },

    #[error("Failed to start `{command}`: {source}")]
    AnalyzerSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Analyzer failed on #{case} {gt_type}: exit status {}", exit_code_text(.code))]
    AnalyzerExit {
        case: CaseId,
        gt_type: GroundTruthType,
        code: Option<i32>,
    },

    #[error("Analyzer timed out on #{case} {gt_type} after {timeout_ms}ms")]
    AnalyzerTimeout {
        case: CaseId,
        gt_type: GroundTruthType,
        timeout_ms: u64,
    },

    #[error("No score for #{case} {gt_type}: {reason}")]
    ScoreParse {
        case: CaseId,
        gt_type: GroundTruthType,
        reason: String,
    },

    #[error("Score {score} for #{case} {gt_type} is outside [0, 1]")]
    ScoreRange {
        case: CaseId,
        gt_type: GroundTruthType,
        score: f64,
    },

    #[error("{metric} is undefined: zero denominator")]
    MetricUndefined { metric: &'static str },

    #[error("Build `{command}` failed: {reason}")]
    Build { command: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EvalResult<T> = Result<T, EvalError>;

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "killed by signal".to_string(),
    }
}

impl From<crate::config::ConfigError> for EvalError {
    fn from(e: crate::config::ConfigError) -> Self {
        EvalError::Config(e.to_string())
    }
}
