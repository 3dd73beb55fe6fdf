//! Case evaluation: score normalization and the outcome decision rule

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::analyzer::Analyzer;
use crate::corpus::{CaseId, Corpus, Partition};
use crate::error::{EvalError, EvalResult};

/// Score at or above which an analyzer result counts as a hit
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Which binary variant is under analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundTruthType {
    /// The vulnerable variant is expected to be present
    Prepatch,
    /// The fixed variant is expected to be present
    Postpatch,
}

impl GroundTruthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroundTruthType::Prepatch => "prepatch",
            GroundTruthType::Postpatch => "postpatch",
        }
    }

    /// Sweep order for each case
    pub fn all() -> [GroundTruthType; 2] {
        [GroundTruthType::Prepatch, GroundTruthType::Postpatch]
    }
}

impl fmt::Display for GroundTruthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GroundTruthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prepatch" => Ok(GroundTruthType::Prepatch),
            "postpatch" => Ok(GroundTruthType::Postpatch),
            other => Err(format!("unknown ground-truth type: {}", other)),
        }
    }
}

/// Confusion-matrix class of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    TruePositive,
    FalsePositive,
    TrueNegative,
    FalseNegative,
}

impl OutcomeClass {
    pub fn abbrev(&self) -> &'static str {
        match self {
            OutcomeClass::TruePositive => "TP",
            OutcomeClass::FalsePositive => "FP",
            OutcomeClass::TrueNegative => "TN",
            OutcomeClass::FalseNegative => "FN",
        }
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbrev())
    }
}

/// Replace NaN with 0.0 and reject anything outside [0, 1]
pub fn normalize_score(case: CaseId, gt_type: GroundTruthType, raw: f64) -> EvalResult<f64> {
    let score = if raw.is_nan() { 0.0 } else { raw };
    if (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(EvalError::ScoreRange { case, gt_type, score })
    }
}

/// Score as printed in progress lines: `nan` for NaN, shortest float form otherwise
pub fn format_score(raw: f64) -> String {
    if raw.is_nan() {
        "nan".to_string()
    } else {
        format!("{:?}", raw)
    }
}

/// Threshold decision rule mapping a score to an outcome class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    threshold: f64,
}

impl Classifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify a normalized score.
    ///
    /// A prepatch hit is a true positive and a prepatch miss a false
    /// positive; a postpatch hit is a true negative and a postpatch miss a
    /// false negative. The threshold itself counts as a hit.
    pub fn classify(&self, gt_type: GroundTruthType, score: f64) -> OutcomeClass {
        let hit = score >= self.threshold;
        match (gt_type, hit) {
            (GroundTruthType::Prepatch, true) => OutcomeClass::TruePositive,
            (GroundTruthType::Prepatch, false) => OutcomeClass::FalsePositive,
            (GroundTruthType::Postpatch, true) => OutcomeClass::TrueNegative,
            (GroundTruthType::Postpatch, false) => OutcomeClass::FalseNegative,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Result of evaluating one (case, ground-truth type) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub case: CaseId,
    pub gt_type: GroundTruthType,
    pub partition: Partition,
    /// Score as reported by the analyzer
    pub raw_score: f64,
    /// Score after NaN substitution
    pub score: f64,
    pub outcome: OutcomeClass,
}

/// Runs the analyzer for a pair and classifies its score
pub struct CaseEvaluator {
    corpus: Arc<Corpus>,
    analyzer: Arc<dyn Analyzer>,
    classifier: Classifier,
}

impl CaseEvaluator {
    pub fn new(corpus: Arc<Corpus>, analyzer: Arc<dyn Analyzer>, classifier: Classifier) -> Self {
        Self {
            corpus,
            analyzer,
            classifier,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn analyzer_name(&self) -> &str {
        self.analyzer.name()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Evaluate one pair. Any failure is returned as-is; nothing is retried.
    pub async fn evaluate(&self, case: CaseId, gt_type: GroundTruthType) -> EvalResult<Evaluation> {
        self.corpus.partition_of(case)?;

        tracing::debug!("Analyzing #{} {} with {}", case, gt_type, self.analyzer.name());
        let raw = self.analyzer.analyze(case, gt_type).await?;
        self.score_pair(case, gt_type, raw)
    }

    /// Classify a raw score already obtained for a pair
    pub fn score_pair(&self, case: CaseId, gt_type: GroundTruthType, raw: f64) -> EvalResult<Evaluation> {
        let partition = self.corpus.partition_of(case)?;
        let score = normalize_score(case, gt_type, raw)?;
        let outcome = self.classifier.classify(gt_type, score);

        tracing::debug!("#{} {} scored {} -> {} ({})", case, gt_type, raw, outcome, partition);

        Ok(Evaluation {
            case,
            gt_type,
            partition,
            raw_score: raw,
            score,
            outcome,
        })
    }
}
