//! Evaluation harness for binary patch-presence classifiers
//!
//! Runs an external analyzer over every case of a vulnerability corpus, once
//! against the prepatch binary and once against the postpatch binary, turns
//! each confidence score into a confusion-matrix outcome, and reports
//! accuracy, precision, recall and F1 for the two corpus partitions.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use patch_eval::{
//!     analyzer::ProcessAnalyzer,
//!     config::Config,
//!     corpus::Corpus,
//!     evaluator::{CaseEvaluator, Classifier},
//!     reporting::render_table,
//!     runner::Sweep,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default()?;
//!     let corpus = Arc::new(Corpus::new(&config.corpus)?);
//!     let analyzer = Arc::new(ProcessAnalyzer::from_config(&config.analyzer)?);
//!     let evaluator = CaseEvaluator::new(corpus, analyzer, Classifier::new(config.sweep.threshold));
//!
//!     let outcome = Sweep::new(evaluator).run().await?;
//!     print!("{}", render_table(&outcome.tally, &config.report.title)?);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluator;
pub mod reporting;
pub mod runner;

pub use config::Config;
pub use error::{EvalError, EvalResult};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{ConfusionMatrix, PartitionSummary, Tally};
    pub use crate::analyzer::{Analyzer, ProcessAnalyzer};
    pub use crate::config::Config;
    pub use crate::corpus::{CaseId, Corpus, CorpusConfig, Partition};
    pub use crate::error::{EvalError, EvalResult};
    pub use crate::evaluator::{CaseEvaluator, Classifier, Evaluation, GroundTruthType, OutcomeClass};
    pub use crate::reporting::{print_console_report, render_report, render_table, JsonSummary};
    pub use crate::runner::{BuildStep, ConsoleProgress, Sweep, SweepOutcome};
}
