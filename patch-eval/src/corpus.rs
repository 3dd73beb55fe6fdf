//! Corpus model: valid case identifiers and the D1/D2 partition
//!
//! The corpus is built from [`CorpusConfig`], so the reference tables live in
//! configuration rather than in module-level state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{EvalError, EvalResult};

/// Identifier of a vulnerability case in the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub u32);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CaseId {
    fn from(id: u32) -> Self {
        CaseId(id)
    }
}

/// Evaluation group a case is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Partition {
    D1,
    D2,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::D1 => "D1",
            Partition::D2 => "D2",
        }
    }

    pub fn all() -> [Partition; 2] {
        [Partition::D1, Partition::D2]
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static corpus tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Exclusive upper bound of case identifiers; valid ids are `1..max_case`
    #[serde(default = "default_max_case")]
    pub max_case: u32,
    /// Cases dropped from the corpus
    #[serde(default = "default_excluded")]
    pub excluded: Vec<u32>,
    /// Individually listed D1 members
    #[serde(default = "default_d1_cases")]
    pub d1_cases: Vec<u32>,
    /// Inclusive `[start, end]` ranges of D1 members
    #[serde(default = "default_d1_ranges")]
    pub d1_ranges: Vec<[u32; 2]>,
}

fn default_max_case() -> u32 { 117 }
fn default_excluded() -> Vec<u32> { vec![62, 63, 67, 72, 73, 74] }
fn default_d1_cases() -> Vec<u32> { vec![2, 6, 7, 11, 42, 59, 60] }
fn default_d1_ranges() -> Vec<[u32; 2]> { vec![[80, 116]] }

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            max_case: default_max_case(),
            excluded: default_excluded(),
            d1_cases: default_d1_cases(),
            d1_ranges: default_d1_ranges(),
        }
    }
}

/// Immutable view of the corpus used to drive and bucket the sweep
#[derive(Debug, Clone)]
pub struct Corpus {
    max_case: u32,
    excluded: BTreeSet<CaseId>,
    d1: BTreeSet<CaseId>,
}

impl Corpus {
    /// Build the corpus from its configuration tables
    pub fn new(config: &CorpusConfig) -> EvalResult<Self> {
        if config.max_case < 2 {
            return Err(EvalError::Config(format!(
                "corpus.max_case must be at least 2, got {}",
                config.max_case
            )));
        }
        if let Some([start, end]) = config.d1_ranges.iter().find(|[s, e]| s > e) {
            return Err(EvalError::Config(format!(
                "corpus.d1_ranges entry [{}, {}] is reversed",
                start, end
            )));
        }
        Ok(Self::from_tables(config))
    }

    fn from_tables(config: &CorpusConfig) -> Self {
        let mut d1: BTreeSet<CaseId> = config.d1_cases.iter().copied().map(CaseId).collect();
        // Ids at or past max_case are never valid, so ranges stop short of it.
        let last_case = config.max_case.saturating_sub(1);
        for &[start, end] in &config.d1_ranges {
            d1.extend((start..=end.min(last_case)).map(CaseId));
        }

        Self {
            max_case: config.max_case,
            excluded: config.excluded.iter().copied().map(CaseId).collect(),
            d1,
        }
    }

    /// True iff the case is in range and not excluded
    pub fn is_valid(&self, case: CaseId) -> bool {
        case.0 >= 1 && case.0 < self.max_case && !self.excluded.contains(&case)
    }

    /// Partition a valid case belongs to
    pub fn partition_of(&self, case: CaseId) -> EvalResult<Partition> {
        if !self.is_valid(case) {
            return Err(EvalError::Domain { case });
        }
        if self.d1.contains(&case) {
            Ok(Partition::D1)
        } else {
            Ok(Partition::D2)
        }
    }

    /// All valid cases in ascending order
    pub fn all_valid_cases(&self) -> Vec<CaseId> {
        (1..self.max_case)
            .map(CaseId)
            .filter(|c| !self.excluded.contains(c))
            .collect()
    }

    /// Valid cases of one partition in ascending order
    pub fn cases_in(&self, partition: Partition) -> Vec<CaseId> {
        self.all_valid_cases()
            .into_iter()
            .filter(|&c| {
                let in_d1 = self.d1.contains(&c);
                match partition {
                    Partition::D1 => in_d1,
                    Partition::D2 => !in_d1,
                }
            })
            .collect()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::from_tables(&CorpusConfig::default())
    }
}
