//! One-shot build of the analyzer before a run

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::BuildConfig;
use crate::error::{EvalError, EvalResult};

/// Compile/install command that must succeed before analysis
#[derive(Debug, Clone)]
pub struct BuildStep {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl BuildStep {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
        }
    }

    /// Build step from configuration, `None` when disabled
    pub fn from_config(config: &BuildConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let mut step = Self::new(&config.program, config.args.clone());
        if let Some(dir) = &config.working_dir {
            step = step.with_working_dir(dir);
        }
        Some(step)
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the build with its output discarded
    pub async fn run(&self) -> EvalResult<()> {
        let command = self.command_line();
        tracing::info!("Building: {}", command);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let status = cmd.status().await.map_err(|e| EvalError::Build {
            command: command.clone(),
            reason: e.to_string(),
        })?;

        if !status.success() {
            tracing::error!("Compile failed");
            return Err(EvalError::Build {
                command,
                reason: format!("exited with {}", status),
            });
        }
        Ok(())
    }
}
