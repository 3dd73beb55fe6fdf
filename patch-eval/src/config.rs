//! Configuration management for the evaluation harness
//!
//! Loads corpus tables, the analyzer command, and run settings from TOML files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::corpus::CorpusConfig;
use crate::evaluator::DEFAULT_THRESHOLD;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// External analyzer invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Name shown in logs and the JSON summary
    #[serde(default = "default_analyzer_name")]
    pub name: String,
    #[serde(default = "default_analyzer_program")]
    pub program: String,
    /// Arguments; `{case}` and `{gt_type}` are substituted per invocation
    #[serde(default = "default_analyzer_args")]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Token that starts the score line on stdout
    #[serde(default = "default_result_marker")]
    pub result_marker: String,
    /// Per-invocation timeout, 0 disables
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Build step run before any analyzer invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_build_program")]
    pub program: String,
    #[serde(default = "default_build_args")]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<String>,
}

/// Sweep execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Score at or above which a result is a hit
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Collect per-case failures instead of aborting on the first one
    #[serde(default)]
    pub keep_going: bool,
}

/// Report output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Title in the first header line of the console table
    #[serde(default = "default_title")]
    pub title: String,
    /// Write a JSON summary here after the sweep
    #[serde(default)]
    pub json_path: Option<String>,
}

// Default value functions
fn default_true() -> bool { true }
fn default_analyzer_name() -> String { "ppt4j".to_string() }
fn default_analyzer_program() -> String { "java".to_string() }
fn default_analyzer_args() -> Vec<String> {
    ["-cp", "lib/*:framework/target/classes/", "ppt4j.Main", "analyze", "{case}", "{gt_type}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_result_marker() -> String { "Result:".to_string() }
fn default_timeout_ms() -> u64 { 30 * 60 * 1000 }
fn default_build_program() -> String { "mvn".to_string() }
fn default_build_args() -> Vec<String> {
    ["clean", "install", "-DskipTests"].iter().map(|s| s.to_string()).collect()
}
fn default_threshold() -> f64 { DEFAULT_THRESHOLD }
fn default_title() -> String { "PPT4J".to_string() }

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            name: default_analyzer_name(),
            program: default_analyzer_program(),
            args: default_analyzer_args(),
            working_dir: None,
            result_marker: default_result_marker(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: default_build_program(),
            args: default_build_args(),
            working_dir: None,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            keep_going: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            json_path: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default config location under the current directory
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Load the first default config file found under `dir`.
    ///
    /// Defaults apply only when no candidate file exists; a file that is
    /// present but unreadable or invalid is an error.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let config_paths = ["patch-eval.toml", "config/patch-eval.toml"];

        for path in config_paths.iter().map(|p| dir.join(p)) {
            if !path.exists() {
                continue;
            }
            let config = Self::from_file(&path)
                .map_err(|e| e.context(&path.display().to_string()))?;
            tracing::info!("Loaded configuration from {}", path.display());
            return Ok(config);
        }

        tracing::info!("Using default configuration");
        Ok(Self::default())
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Reject settings that cannot produce a meaningful run
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.sweep.threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "sweep.threshold must be in (0, 1], got {}",
                t
            )));
        }
        if self.analyzer.program.trim().is_empty() {
            return Err(ConfigError::Invalid("analyzer.program is empty".to_string()));
        }
        if self.build.enabled && self.build.program.trim().is_empty() {
            return Err(ConfigError::Invalid("build.program is empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl ConfigError {
    /// Prefix the message with where the configuration came from
    pub fn context(self, origin: &str) -> Self {
        match self {
            ConfigError::Io(e) => ConfigError::Io(format!("{}: {}", origin, e)),
            ConfigError::Parse(e) => ConfigError::Parse(format!("{}: {}", origin, e)),
            ConfigError::Invalid(e) => ConfigError::Invalid(format!("{}: {}", origin, e)),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sweep.threshold, 0.6);
        assert_eq!(config.corpus.max_case, 117);
        assert_eq!(config.analyzer.result_marker, "Result:");
        assert!(config.build.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
[analyzer]
program = "./analyze.sh"
args = ["{case}", "{gt_type}"]
timeout_ms = 5000

[build]
enabled = false

[corpus]
excluded = [3]
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.analyzer.program, "./analyze.sh");
        assert_eq!(config.analyzer.name, "ppt4j");
        assert_eq!(config.analyzer.timeout_ms, 5000);
        assert!(!config.build.enabled);
        assert_eq!(config.corpus.excluded, vec![3]);
        assert_eq!(config.corpus.d1_ranges, vec![[80, 116]]);
        assert_eq!(config.report.title, "PPT4J");
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = Config::from_toml("[sweep]\nthreshold = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(Config::from_toml("[sweep]\nthreshold = 0.0\n").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch-eval.toml");
        let config = Config::default();
        config.save_toml(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Config::from_file("/nonexistent/patch-eval.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_load_from_dir_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from_dir(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_dir_finds_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        fs::write(dir.path().join("config/patch-eval.toml"), "[build]\nenabled = false\n").unwrap();

        let config = Config::load_from_dir(dir.path()).unwrap();
        assert!(!config.build.enabled);
    }

    #[test]
    fn test_invalid_file_is_not_replaced_by_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patch-eval.toml");
        fs::write(
            &path,
            "[sweep]\nthreshold = 1.5\n\n[build]\nenabled = false\n\n[analyzer]\nprogram = \"./my-analyzer\"\n",
        )
        .unwrap();

        let err = Config::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("patch-eval.toml"));
        assert!(err.to_string().contains("sweep.threshold"));

        fs::write(&path, "[sweep\nthreshold = 0.5\n").unwrap();
        assert!(matches!(Config::load_from_dir(dir.path()), Err(ConfigError::Parse(_))));
    }
}
