//! Build step and evaluation sweep

pub mod build;
pub mod sweep;

pub use build::BuildStep;
pub use sweep::{CaseFailure, ConsoleProgress, NoOpProgress, ProgressCallback, Sweep, SweepOutcome};
