//! Results reporting

pub mod table;

pub use table::{render_partial_table, render_summaries, render_table};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::PartitionSummary;
use crate::error::EvalResult;
use crate::runner::{CaseFailure, SweepOutcome};

/// JSON summary export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub run_id: String,
    pub timestamp: String,
    pub analyzer: String,
    pub threshold: f64,
    pub total_evaluations: usize,
    pub partitions: IndexMap<String, PartitionSummary>,
    pub failures: Vec<CaseFailure>,
}

impl JsonSummary {
    /// Create from a finished sweep.
    ///
    /// A complete sweep fails on any undefined metric; a partial one writes
    /// undefined metrics as `null`.
    pub fn from_outcome(
        run_id: impl Into<String>,
        analyzer: impl Into<String>,
        threshold: f64,
        outcome: &SweepOutcome,
    ) -> EvalResult<Self> {
        let partitions = summarize_outcome(outcome)?
            .into_iter()
            .map(|s| (s.partition.to_string(), s))
            .collect();

        Ok(Self {
            run_id: run_id.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            analyzer: analyzer.into(),
            threshold,
            total_evaluations: outcome.evaluations.len(),
            partitions,
            failures: outcome.failures.clone(),
        })
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

fn summarize_outcome(outcome: &SweepOutcome) -> EvalResult<Vec<PartitionSummary>> {
    if outcome.is_complete() {
        outcome.tally.summarize()
    } else {
        Ok(outcome.tally.summarize_partial())
    }
}

/// Console report text: the partition table, then the failure list for partial runs
pub fn render_report(outcome: &SweepOutcome, title: &str) -> EvalResult<String> {
    let mut out = render_summaries(&summarize_outcome(outcome)?, title);

    if !outcome.failures.is_empty() {
        out.push('\n');
        out.push_str(&format!("Failed pairs ({}):\n", outcome.failures.len()));
        for f in &outcome.failures {
            out.push_str(&format!("  #{} {}: {}\n", f.case, f.gt_type, f.error));
        }
    }
    Ok(out)
}

/// Print the console report
pub fn print_console_report(outcome: &SweepOutcome, title: &str) -> EvalResult<()> {
    print!("{}", render_report(outcome, title)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Tally;
    use crate::corpus::{CaseId, Partition};
    use crate::evaluator::{GroundTruthType, OutcomeClass};

    fn outcome() -> SweepOutcome {
        let mut tally = Tally::new();
        for p in Partition::all() {
            tally.record(p, OutcomeClass::TruePositive);
            tally.record(p, OutcomeClass::FalseNegative);
        }
        SweepOutcome {
            tally,
            evaluations: Vec::new(),
            failures: vec![CaseFailure {
                case: CaseId(9),
                gt_type: GroundTruthType::Prepatch,
                error: "Analyzer timed out".to_string(),
            }],
        }
    }

    #[test]
    fn test_json_summary_roundtrip() {
        let summary = JsonSummary::from_outcome("20261017-120000", "ppt4j", 0.6, &outcome()).unwrap();
        let keys: Vec<_> = summary.partitions.keys().cloned().collect();
        assert_eq!(keys, vec!["D1", "D2"]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary.write_to_file(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["partitions"]["D1"]["counts"]["tp"], 1);
        assert_eq!(value["partitions"]["D2"]["recall"], 0.5);
        assert_eq!(value["failures"][0]["gt_type"], "prepatch");
    }

    /// Every D1 pair failed; D2 was scored
    fn outcome_without_d1() -> SweepOutcome {
        let mut tally = Tally::new();
        tally.record(Partition::D2, OutcomeClass::TruePositive);
        tally.record(Partition::D2, OutcomeClass::TrueNegative);
        let failures = GroundTruthType::all()
            .into_iter()
            .map(|gt_type| CaseFailure {
                case: CaseId(2),
                gt_type,
                error: "Analyzer failed on #2: exit status 1".to_string(),
            })
            .collect();
        SweepOutcome {
            tally,
            evaluations: Vec::new(),
            failures,
        }
    }

    #[test]
    fn test_partial_report_keeps_failure_list() {
        let report = render_report(&outcome_without_d1(), "PPT4J").unwrap();
        assert!(report.contains("D1  n/a     n/a     n/a     n/a\n"));
        assert!(report.contains("D2  1.0000  1.0000  1.0000  1.0000\n"));
        assert!(report.contains("Failed pairs (2):"));
        assert!(report.contains("  #2 postpatch: Analyzer failed"));
    }

    #[test]
    fn test_partial_json_writes_null_metrics() {
        let summary = JsonSummary::from_outcome("run", "ppt4j", 0.6, &outcome_without_d1()).unwrap();
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value["partitions"]["D1"]["accuracy"].is_null());
        assert!(value["partitions"]["D1"]["f1"].is_null());
        assert_eq!(value["partitions"]["D2"]["precision"], 1.0);
        assert_eq!(value["failures"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_complete_run_still_requires_defined_metrics() {
        let mut outcome = outcome_without_d1();
        outcome.failures.clear();
        assert!(render_report(&outcome, "PPT4J").is_err());
        assert!(JsonSummary::from_outcome("run", "ppt4j", 0.6, &outcome).is_err());
    }
}
