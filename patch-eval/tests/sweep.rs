//! End-to-end sweeps over the reference corpus with in-memory analyzers

mod common;

use std::sync::Arc;

use common::{reference_scores, sweep_with, ScriptedAnalyzer};
use patch_eval::prelude::*;

#[tokio::test]
async fn reference_sweep_covers_every_pair() {
    let corpus = Corpus::default();
    let analyzer = Arc::new(reference_scores(&corpus));
    let outcome = sweep_with(corpus, analyzer.clone()).run().await.unwrap();

    assert_eq!(analyzer.call_count(), 220);
    assert_eq!(outcome.evaluations.len(), 220);
    assert_eq!(outcome.tally.total(), 220);
    assert_eq!(outcome.tally.matrix(Partition::D1).total(), 88);
    assert_eq!(outcome.tally.matrix(Partition::D2).total(), 132);
    assert!(outcome.is_complete());
}

#[tokio::test]
async fn sweep_is_idempotent() {
    let corpus = Corpus::default();
    let analyzer = Arc::new(reference_scores(&corpus));

    let first = sweep_with(corpus.clone(), analyzer.clone()).run().await.unwrap();
    let second = sweep_with(corpus, analyzer).run().await.unwrap();

    assert_eq!(first.tally, second.tally);
    assert_eq!(
        render_table(&first.tally, "PPT4J").unwrap(),
        render_table(&second.tally, "PPT4J").unwrap()
    );
}

#[tokio::test]
async fn nan_scores_count_as_misses() {
    let corpus = Corpus::default();
    let analyzer = Arc::new(reference_scores(&corpus));
    let outcome = sweep_with(corpus, analyzer).run().await.unwrap();

    let nan_case = outcome
        .evaluations
        .iter()
        .find(|e| e.case == CaseId(13) && e.gt_type == GroundTruthType::Prepatch)
        .unwrap();
    assert!(nan_case.raw_score.is_nan());
    assert_eq!(nan_case.score, 0.0);
    assert_eq!(nan_case.outcome, OutcomeClass::FalsePositive);
    assert_eq!(nan_case.partition, Partition::D2);
}

#[tokio::test]
async fn perfect_analyzer_scores_one() {
    // Prepatch hits are true positives, postpatch hits true negatives.
    let analyzer = Arc::new(ScriptedAnalyzer::new().with_fallback(1.0));
    let outcome = sweep_with(Corpus::default(), analyzer).run().await.unwrap();

    let d1 = outcome.tally.matrix(Partition::D1);
    assert_eq!(d1, ConfusionMatrix::new(44, 0, 44, 0));
    for summary in outcome.tally.summarize().unwrap() {
        assert_eq!(summary.accuracy, Some(1.0));
        assert_eq!(summary.precision, Some(1.0));
        assert_eq!(summary.recall, Some(1.0));
        assert_eq!(summary.f1, Some(1.0));
    }
}

#[tokio::test]
async fn silent_analyzer_leaves_f1_undefined() {
    let analyzer = Arc::new(ScriptedAnalyzer::new().with_fallback(0.0));
    let outcome = sweep_with(Corpus::default(), analyzer).run().await.unwrap();

    assert_eq!(outcome.tally.matrix(Partition::D2), ConfusionMatrix::new(0, 66, 0, 66));
    assert!(matches!(
        render_table(&outcome.tally, "PPT4J"),
        Err(EvalError::MetricUndefined { metric: "f1" })
    ));
}

#[tokio::test]
async fn missing_score_aborts_sweep() {
    let corpus = Corpus::default();
    let mut analyzer = ScriptedAnalyzer::new();
    for case in corpus.all_valid_cases().into_iter().filter(|c| c.0 != 50) {
        analyzer = analyzer
            .with_score(case.0, GroundTruthType::Prepatch, 0.7)
            .with_score(case.0, GroundTruthType::Postpatch, 0.7);
    }
    let analyzer = Arc::new(analyzer);

    let err = sweep_with(corpus, analyzer.clone()).run().await.unwrap_err();
    assert!(matches!(err, EvalError::ScoreParse { case: CaseId(50), .. }));
    // 49 complete cases before #50, then its failing prepatch call.
    assert_eq!(analyzer.call_count(), 49 * 2 + 1);
}

#[tokio::test]
async fn out_of_range_score_aborts_sweep() {
    let analyzer = Arc::new(
        ScriptedAnalyzer::new()
            .with_fallback(0.5)
            .with_score(7, GroundTruthType::Postpatch, 1.1),
    );
    let err = sweep_with(Corpus::default(), analyzer).run().await.unwrap_err();
    assert!(matches!(
        err,
        EvalError::ScoreRange { case: CaseId(7), gt_type: GroundTruthType::Postpatch, .. }
    ));
    assert!(err.to_string().contains("#7 postpatch"));
}

#[tokio::test]
async fn keep_going_reports_partial_statistics() {
    let analyzer = Arc::new(
        ScriptedAnalyzer::new()
            .with_fallback(0.8)
            .with_score(7, GroundTruthType::Postpatch, -0.1),
    );
    let outcome = sweep_with(Corpus::default(), analyzer)
        .keep_going(true)
        .run()
        .await
        .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].case, CaseId(7));
    assert_eq!(outcome.failures[0].gt_type, GroundTruthType::Postpatch);
    assert_eq!(outcome.tally.total(), 219);
    assert_eq!(outcome.tally.matrix(Partition::D1), ConfusionMatrix::new(44, 0, 43, 0));
}

#[tokio::test]
async fn keep_going_reports_failures_when_a_partition_is_empty() {
    let corpus = Corpus::default();
    let mut analyzer = ScriptedAnalyzer::new();
    for case in corpus.cases_in(Partition::D2) {
        analyzer = analyzer
            .with_score(case.0, GroundTruthType::Prepatch, 0.9)
            .with_score(case.0, GroundTruthType::Postpatch, 0.2);
    }
    let outcome = sweep_with(corpus, Arc::new(analyzer))
        .keep_going(true)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.failures.len(), 88);
    assert!(outcome.tally.matrix(Partition::D1).is_empty());
    assert_eq!(outcome.tally.matrix(Partition::D2), ConfusionMatrix::new(66, 0, 0, 66));

    let report = render_report(&outcome, "PPT4J").unwrap();
    assert!(report.contains("D1  n/a     n/a     n/a     n/a\n"));
    assert!(report.contains("D2  0.5000  1.0000  0.5000  0.6667\n"));
    assert!(report.contains("Failed pairs (88):"));
    assert!(report.contains("  #2 prepatch: No score for #2 prepatch"));

    let summary = JsonSummary::from_outcome("run", "scripted", 0.6, &outcome).unwrap();
    assert_eq!(summary.failures.len(), 88);
    assert_eq!(summary.partitions["D1"].accuracy, None);
    assert_eq!(summary.partitions["D2"].precision, Some(1.0));
}
