//! Fixed-width console table

use std::fmt::Write;

use crate::analysis::{PartitionSummary, Tally};
use crate::error::EvalResult;

/// Render the two-line header and one row per partition.
///
/// Fails if any partition has an undefined metric.
pub fn render_table(tally: &Tally, title: &str) -> EvalResult<String> {
    let summaries = tally.summarize()?;
    Ok(render_summaries(&summaries, title))
}

/// Render a table for a run that skipped failed pairs; undefined metrics show as `n/a`
pub fn render_partial_table(tally: &Tally, title: &str) -> String {
    render_summaries(&tally.summarize_partial(), title)
}

pub fn render_summaries(summaries: &[PartitionSummary], title: &str) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "-----------   {}   ------------", title);
    let _ = writeln!(out, "    ACC     PREC    RECALL  F1    ");
    for s in summaries {
        let row = format!(
            "{}  {}  {}  {}  {}",
            s.partition,
            cell(s.accuracy),
            cell(s.precision),
            cell(s.recall),
            cell(s.f1)
        );
        let _ = writeln!(out, "{}", row.trim_end());
    }
    out
}

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => format!("{:<6}", "n/a"),
    }
}
