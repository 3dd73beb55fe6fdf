//! Subprocess-backed analyzer
//!
//! Spawns the configured analyzer command once per (case, ground-truth type)
//! pair and extracts the score from the marker line on its stdout.

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::traits::Analyzer;
use crate::config::AnalyzerConfig;
use crate::corpus::CaseId;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::GroundTruthType;

/// Finds the score line in analyzer output
#[derive(Debug, Clone)]
pub struct ScoreExtractor {
    marker: String,
    pattern: Regex,
}

impl ScoreExtractor {
    /// Match lines whose first non-blank text is `marker`
    pub fn new(marker: &str) -> EvalResult<Self> {
        if marker.trim().is_empty() {
            return Err(EvalError::Config("analyzer.result_marker must not be empty".to_string()));
        }
        let pattern = Regex::new(&format!(r"^\s*{}", regex::escape(marker)))
            .map_err(|e| EvalError::Config(format!("invalid result marker {:?}: {}", marker, e)))?;
        Ok(Self {
            marker: marker.to_string(),
            pattern,
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Parse the last token of the first marker line as a float
    pub fn extract(&self, output: &str) -> Result<f64, String> {
        let line = output
            .lines()
            .find(|line| self.pattern.is_match(line))
            .ok_or_else(|| format!("no line starting with {:?}", self.marker))?;

        let token = line
            .split_whitespace()
            .last()
            .ok_or_else(|| format!("empty result line {:?}", line))?;

        token
            .parse::<f64>()
            .map_err(|e| format!("unparsable score {:?}: {}", token, e))
    }
}

/// Extract a score from analyzer output using `marker`
pub fn parse_score(output: &str, marker: &str) -> Result<f64, String> {
    let extractor = ScoreExtractor::new(marker).map_err(|e| e.to_string())?;
    extractor.extract(output)
}

/// Captured output of one analyzer invocation
#[derive(Debug, Clone)]
pub struct AnalyzerRun {
    pub case: CaseId,
    pub gt_type: GroundTruthType,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Analyzer that runs an external command per evaluation
#[derive(Debug, Clone)]
pub struct ProcessAnalyzer {
    name: String,
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout_ms: u64,
    extractor: ScoreExtractor,
}

impl ProcessAnalyzer {
    /// Create an analyzer running `program args...`.
    ///
    /// `{case}` and `{gt_type}` in any argument are replaced per invocation.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> EvalResult<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(EvalError::Config("analyzer.program must not be empty".to_string()));
        }
        Ok(Self {
            name: program.clone(),
            program,
            args,
            working_dir: None,
            timeout_ms: 0,
            extractor: ScoreExtractor::new("Result:")?,
        })
    }

    /// Build from the `[analyzer]` configuration section
    pub fn from_config(config: &AnalyzerConfig) -> EvalResult<Self> {
        let mut analyzer = Self::new(&config.program, config.args.clone())?
            .with_marker(&config.result_marker)?
            .with_timeout_ms(config.timeout_ms);
        if !config.name.is_empty() {
            analyzer = analyzer.with_name(&config.name);
        }
        if let Some(dir) = &config.working_dir {
            analyzer = analyzer.with_working_dir(dir);
        }
        Ok(analyzer)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Per-invocation timeout; 0 waits indefinitely
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_marker(mut self, marker: &str) -> EvalResult<Self> {
        self.extractor = ScoreExtractor::new(marker)?;
        Ok(self)
    }

    /// Arguments for one invocation
    pub fn render_args(&self, case: CaseId, gt_type: GroundTruthType) -> Vec<String> {
        let case = case.to_string();
        self.args
            .iter()
            .map(|a| a.replace("{case}", &case).replace("{gt_type}", gt_type.as_str()))
            .collect()
    }

    /// Run the analyzer for one pair and keep its full output.
    ///
    /// Only spawn failures and timeouts are errors here; the exit status is
    /// checked by [`ProcessAnalyzer::score`].
    pub async fn capture(&self, case: CaseId, gt_type: GroundTruthType) -> EvalResult<AnalyzerRun> {
        let args = self.render_args(case, gt_type);

        let mut cmd = Command::new(&self.program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let child = cmd.spawn().map_err(|source| EvalError::AnalyzerSpawn {
            command: self.display_command(&args),
            source,
        })?;

        // Dropping the pending wait on timeout kills the child.
        let output = if self.timeout_ms == 0 {
            child.wait_with_output().await?
        } else {
            match tokio::time::timeout(Duration::from_millis(self.timeout_ms), child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::warn!("#{} {} exceeded {}ms, killing analyzer", case, gt_type, self.timeout_ms);
                    return Err(EvalError::AnalyzerTimeout {
                        case,
                        gt_type,
                        timeout_ms: self.timeout_ms,
                    });
                }
            }
        };

        tracing::debug!(
            "Analyzer for #{} {} exited with {} after {}ms",
            case,
            gt_type,
            output.status,
            start.elapsed().as_millis()
        );

        Ok(AnalyzerRun {
            case,
            gt_type,
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Check the exit status of a captured run and extract its score
    pub fn score(&self, run: &AnalyzerRun) -> EvalResult<f64> {
        let (case, gt_type) = (run.case, run.gt_type);
        if !run.status.success() {
            if let Some(last) = run.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                tracing::error!("#{} {} stderr: {}", case, gt_type, last);
            }
            return Err(EvalError::AnalyzerExit {
                case,
                gt_type,
                code: run.status.code(),
            });
        }

        self.extractor
            .extract(&run.stdout)
            .map_err(|reason| EvalError::ScoreParse { case, gt_type, reason })
    }

    fn display_command(&self, args: &[String]) -> String {
        std::iter::once(self.program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl Analyzer for ProcessAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, case: CaseId, gt_type: GroundTruthType) -> EvalResult<f64> {
        let run = self.capture(case, gt_type).await?;
        self.score(&run)
    }
}
