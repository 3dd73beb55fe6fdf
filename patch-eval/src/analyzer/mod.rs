//! Analyzer implementations

pub mod process;
pub mod traits;

pub use process::{parse_score, AnalyzerRun, ProcessAnalyzer, ScoreExtractor};
pub use traits::Analyzer;
