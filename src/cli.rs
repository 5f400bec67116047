//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::SkewnessEstimator;
use crate::models::ScoreField;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// kpicompare - compare a supervisor's KPI against their team
///
/// Loads a performance table, resolves the selected worker and their
/// subordinates (or peers), and reports mean, spread, skewness and the
/// percentage gap, with chart series and optional AI commentary.
///
/// Examples:
///   kpicompare supervisors --data kinerja.csv
///   kpicompare compare --data kinerja.csv --id 1001
///   kpicompare peers --data kinerja.csv --id 1042 --format json -o peers.json
///   kpicompare summary --data kinerja.csv --no-narrate
///   kpicompare --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .kpicompare.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .kpicompare.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the supervisor ids present in the dataset
    Supervisors {
        /// CSV dataset
        #[arg(short, long, value_name = "FILE")]
        data: PathBuf,
    },
    /// Compare a supervisor against their subordinates
    Compare(CompareArgs),
    /// Compare a worker against the peers sharing their supervisor
    Peers(CompareArgs),
    /// Average every score field per organizational level
    Levels(ReportArgs),
    /// Summarize every score field over the whole dataset
    Summary(SummaryArgs),
}

/// Arguments of the `compare` and `peers` commands.
#[derive(clap::Args, Debug, Clone)]
pub struct CompareArgs {
    /// CSV dataset
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// worker_id of the anchor
    #[arg(long, value_name = "ID")]
    pub id: String,

    #[command(flatten)]
    pub chart: ChartArgs,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub narration: NarrationArgs,
}

/// Statistic and chart options.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ChartArgs {
    /// Score field to compare
    ///
    /// Values: final_kpi_score, assessment_score, individual_performance_score
    #[arg(long, value_name = "FIELD")]
    pub field: Option<ScoreField>,

    /// Number of points sampled along the density curves
    #[arg(long, value_name = "COUNT")]
    pub points: Option<usize>,

    /// Number of histogram bins
    #[arg(long, value_name = "COUNT")]
    pub bins: Option<usize>,

    /// Skewness estimator (adjusted, biased)
    #[arg(long, value_name = "ESTIMATOR")]
    pub skewness: Option<SkewnessEstimator>,
}

/// Arguments of commands that only render a report.
#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// CSV dataset
    #[arg(short, long, value_name = "FILE")]
    pub data: PathBuf,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments of the `summary` command.
#[derive(clap::Args, Debug, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Skewness estimator (adjusted, biased)
    #[arg(long, value_name = "ESTIMATOR")]
    pub skewness: Option<SkewnessEstimator>,

    #[command(flatten)]
    pub narration: NarrationArgs,
}

/// Narration service options.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct NarrationArgs {
    /// Skip the AI commentary
    #[arg(long)]
    pub no_narrate: bool,

    /// Ollama model used for the commentary
    #[arg(long, env = "KPICOMPARE_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Command {
    /// Dataset path of the command.
    pub fn data(&self) -> &Path {
        match self {
            Command::Supervisors { data } => data,
            Command::Compare(args) | Command::Peers(args) => &args.data,
            Command::Levels(args) => &args.data,
            Command::Summary(args) => &args.report.data,
        }
    }

    /// Explicit output path, if any.
    pub fn output(&self) -> Option<&Path> {
        match self {
            Command::Supervisors { .. } => None,
            Command::Compare(args) | Command::Peers(args) => args.output.as_deref(),
            Command::Levels(args) => args.output.as_deref(),
            Command::Summary(args) => args.report.output.as_deref(),
        }
    }

    /// Report format; the supervisor listing is always plain text.
    pub fn format(&self) -> OutputFormat {
        match self {
            Command::Supervisors { .. } => OutputFormat::Markdown,
            Command::Compare(args) | Command::Peers(args) => args.format,
            Command::Levels(args) => args.format,
            Command::Summary(args) => args.report.format,
        }
    }

    pub fn chart(&self) -> Option<&ChartArgs> {
        match self {
            Command::Compare(args) | Command::Peers(args) => Some(&args.chart),
            _ => None,
        }
    }

    pub fn skewness(&self) -> Option<SkewnessEstimator> {
        match self {
            Command::Compare(args) | Command::Peers(args) => args.chart.skewness,
            Command::Summary(args) => args.skewness,
            _ => None,
        }
    }

    pub fn narration(&self) -> Option<&NarrationArgs> {
        match self {
            Command::Compare(args) | Command::Peers(args) => Some(&args.narration),
            Command::Summary(args) => Some(&args.narration),
            _ => None,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let Some(command) = self.command.as_ref() else {
            return Err("A command is required (try --help)".to_string());
        };

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let data = command.data();
        if !data.exists() {
            return Err(format!("Dataset does not exist: {}", data.display()));
        }
        if !data.is_file() {
            return Err(format!("Dataset is not a file: {}", data.display()));
        }

        if let Some(chart) = command.chart() {
            if chart.points.is_some_and(|p| p < 2) {
                return Err("Density points must be at least 2".to_string());
            }
            if chart.bins == Some(0) {
                return Err("Histogram bins must be at least 1".to_string());
            }
        }

        if let Command::Compare(args) | Command::Peers(args) = command {
            if args.id.trim().is_empty() {
                return Err("Worker id must not be empty".to_string());
            }
        }

        if let Some(narration) = command.narration() {
            if let Some(ref url) = narration.ollama_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
                }
            }

            if let Some(temperature) = narration.temperature {
                if !(0.0..=1.0).contains(&temperature) {
                    return Err("Temperature must be between 0.0 and 1.0".to_string());
                }
            }

            if narration.timeout == Some(0) {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_args(data: PathBuf) -> Args {
        Args {
            command: Some(Command::Compare(CompareArgs {
                data,
                id: "1001".to_string(),
                chart: ChartArgs::default(),
                format: OutputFormat::Markdown,
                output: None,
                narration: NarrationArgs::default(),
            })),
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    fn compare_args(args: &mut Args) -> &mut CompareArgs {
        match args.command.as_mut() {
            Some(Command::Compare(compare)) => compare,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_validation_accepts_existing_dataset() {
        let file = NamedTempFile::new().unwrap();
        let args = make_args(file.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_dataset() {
        let args = make_args(PathBuf::from("/nonexistent/kinerja.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_chart_bounds() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        compare_args(&mut args).chart.points = Some(1);
        assert!(args.validate().is_err());

        compare_args(&mut args).chart.points = Some(100);
        compare_args(&mut args).chart.bins = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_narration_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        compare_args(&mut args).narration.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());

        compare_args(&mut args).narration.ollama_url = None;
        compare_args(&mut args).narration.temperature = Some(1.5);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_requires_command() {
        let mut args = make_args(PathBuf::from("kinerja.csv"));
        args.command = None;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_compare_command() {
        let args = Args::try_parse_from([
            "kpicompare",
            "compare",
            "--data",
            "kinerja.csv",
            "--id",
            "1001",
            "--field",
            "assessment_score",
            "--skewness",
            "biased",
            "--format",
            "json",
            "--no-narrate",
            "-v",
        ])
        .unwrap();

        assert!(args.verbose);
        match args.command {
            Some(Command::Compare(compare)) => {
                assert_eq!(compare.id, "1001");
                assert_eq!(compare.chart.field, Some(ScoreField::AssessmentScore));
                assert_eq!(compare.chart.skewness, Some(SkewnessEstimator::Biased));
                assert_eq!(compare.format, OutputFormat::Json);
                assert!(compare.narration.no_narrate);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(PathBuf::from("kinerja.csv"));
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
