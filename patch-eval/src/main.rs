//! Patch-presence evaluation CLI

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use patch_eval::{
    analyzer::ProcessAnalyzer,
    config::Config,
    corpus::{CaseId, Corpus, Partition},
    error::EvalError,
    evaluator::{format_score, CaseEvaluator, Classifier, GroundTruthType},
    reporting::{print_console_report, JsonSummary},
    runner::{BuildStep, ConsoleProgress, Sweep},
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "patch-eval")]
#[command(about = "Evaluate a patch-presence analyzer over a vulnerability corpus")]
#[command(version, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Do not run the build step before analyzing
    #[arg(long, global = true)]
    skip_build: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one case against its prepatch binary
    Prepatch {
        /// Case identifier
        case: u32,
    },

    /// Analyze one case against its postpatch binary
    Postpatch {
        /// Case identifier
        case: u32,
    },

    /// Analyze every valid case and report metrics per partition
    All {
        /// Record failing cases and report partial statistics instead of aborting
        #[arg(long)]
        keep_going: bool,

        /// Write a JSON summary to this path
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// List valid cases per partition
    ListCases,

    /// Generate sample configuration
    InitConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = "patch-eval.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("patch_eval=debug,info")
    } else {
        EnvFilter::new("patch_eval=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Prepatch { case } => {
            let config = load_config(cli.config)?;
            run_single(&config, GroundTruthType::Prepatch, CaseId(case), cli.skip_build).await
        }

        Commands::Postpatch { case } => {
            let config = load_config(cli.config)?;
            run_single(&config, GroundTruthType::Postpatch, CaseId(case), cli.skip_build).await
        }

        Commands::All { keep_going, json } => {
            let config = load_config(cli.config)?;
            run_all(&config, keep_going, json, cli.skip_build).await
        }

        Commands::ListCases => {
            let config = load_config(cli.config)?;
            list_cases(&config)?;
            Ok(ExitCode::SUCCESS)
        }

        Commands::InitConfig { output } => {
            init_config(output)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<PathBuf>) -> CliResult<Config> {
    match path {
        Some(path) => {
            let config = Config::from_file(&path)
                .map_err(|e| EvalError::from(e.context(&path.display().to_string())))?;
            tracing::info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => Ok(Config::load_or_default().map_err(EvalError::from)?),
    }
}

async fn build(config: &Config, skip_build: bool) -> CliResult<()> {
    if skip_build {
        tracing::info!("Skipping build step");
        return Ok(());
    }
    if let Some(step) = BuildStep::from_config(&config.build) {
        step.run().await?;
    }
    Ok(())
}

fn make_evaluator(config: &Config, corpus: Arc<Corpus>) -> CliResult<CaseEvaluator> {
    let analyzer = Arc::new(ProcessAnalyzer::from_config(&config.analyzer)?);
    Ok(CaseEvaluator::new(
        corpus,
        analyzer,
        Classifier::new(config.sweep.threshold),
    ))
}

async fn run_single(
    config: &Config,
    gt_type: GroundTruthType,
    case: CaseId,
    skip_build: bool,
) -> CliResult<ExitCode> {
    let corpus = Arc::new(Corpus::new(&config.corpus)?);
    // Reject unknown cases before paying for the build.
    corpus.partition_of(case)?;

    build(config, skip_build).await?;

    // Echo the analyzer's own output before judging it, so a run without a
    // score line can still be inspected.
    let analyzer = Arc::new(ProcessAnalyzer::from_config(&config.analyzer)?);
    let run = analyzer.capture(case, gt_type).await?;
    print!("{}", run.stdout);
    if !run.stdout.is_empty() && !run.stdout.ends_with('\n') {
        println!();
    }
    eprint!("{}", run.stderr);

    let raw = analyzer.score(&run)?;
    let evaluator = CaseEvaluator::new(corpus, analyzer, Classifier::new(config.sweep.threshold));
    let evaluation = evaluator.score_pair(case, gt_type, raw)?;

    println!("#{} {} {}", evaluation.case, evaluation.gt_type, format_score(evaluation.raw_score));
    println!("Partition: {}  Outcome: {}", evaluation.partition, evaluation.outcome);
    Ok(ExitCode::SUCCESS)
}

async fn run_all(
    config: &Config,
    keep_going: bool,
    json: Option<PathBuf>,
    skip_build: bool,
) -> CliResult<ExitCode> {
    let run_id = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let corpus = Arc::new(Corpus::new(&config.corpus)?);

    build(config, skip_build).await?;

    let evaluator = make_evaluator(config, corpus)?;
    let analyzer_name = evaluator.analyzer_name().to_string();
    let sweep = Sweep::new(evaluator)
        .keep_going(keep_going || config.sweep.keep_going)
        .with_progress(Arc::new(ConsoleProgress));

    tracing::info!("Run {} started", run_id);
    let outcome = sweep.run().await?;

    print_console_report(&outcome, &config.report.title)?;

    let json_path = json.or_else(|| config.report.json_path.as_ref().map(PathBuf::from));
    if let Some(path) = json_path {
        let summary = JsonSummary::from_outcome(&run_id, analyzer_name, config.sweep.threshold, &outcome)?;
        summary.write_to_file(&path)?;
        tracing::info!("Summary written to {}", path.display());
    }

    if outcome.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn list_cases(config: &Config) -> CliResult<()> {
    let corpus = Corpus::new(&config.corpus)?;
    for partition in Partition::all() {
        let cases = corpus.cases_in(partition);
        let ids: Vec<String> = cases.iter().map(|c| c.to_string()).collect();
        println!("{} ({}): {}", partition, cases.len(), ids.join(" "));
    }
    Ok(())
}

fn init_config(output: PathBuf) -> CliResult<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Config::default().save_toml(&output)?;
    println!("Configuration written to {}", output.display());
    Ok(())
}
