//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use patch_eval::prelude::*;

/// In-memory analyzer replaying a fixed score table
pub struct ScriptedAnalyzer {
    scores: HashMap<(CaseId, GroundTruthType), f64>,
    fallback: Option<f64>,
    pub calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self {
            scores: HashMap::new(),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Score returned for pairs without an explicit entry
    pub fn with_fallback(mut self, score: f64) -> Self {
        self.fallback = Some(score);
        self
    }

    pub fn with_score(mut self, case: u32, gt_type: GroundTruthType, score: f64) -> Self {
        self.scores.insert((CaseId(case), gt_type), score);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn analyze(&self, case: CaseId, gt_type: GroundTruthType) -> EvalResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.scores
            .get(&(case, gt_type))
            .copied()
            .or(self.fallback)
            .ok_or_else(|| EvalError::ScoreParse {
                case,
                gt_type,
                reason: "no scripted score".to_string(),
            })
    }
}

/// Deterministic pseudo-scores spread over [0, 1], with the occasional NaN
pub fn reference_scores(corpus: &Corpus) -> ScriptedAnalyzer {
    let mut analyzer = ScriptedAnalyzer::new();
    for case in corpus.all_valid_cases() {
        let id = case.0;
        let pre = if id % 13 == 0 { f64::NAN } else { ((id * 37) % 100) as f64 / 100.0 };
        let post = ((id * 53 + 11) % 101) as f64 / 100.0;
        analyzer = analyzer
            .with_score(id, GroundTruthType::Prepatch, pre)
            .with_score(id, GroundTruthType::Postpatch, post);
    }
    analyzer
}

pub fn sweep_with(corpus: Corpus, analyzer: Arc<dyn Analyzer>) -> Sweep {
    Sweep::new(CaseEvaluator::new(Arc::new(corpus), analyzer, Classifier::default()))
}
