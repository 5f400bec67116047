//! kpicompare - KPI comparison of supervisors against their teams
//!
//! A CLI tool that loads an employee performance table, compares a
//! selected worker against their subordinates or peers, and renders the
//! statistics as Markdown or JSON, with optional commentary from Ollama.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable dataset, bad config, write failure, etc.)
//!   2 - Analysis notice (unknown worker, no usable scores, zero mean)

mod analysis;
mod cli;
mod config;
mod dataset;
mod error;
mod models;
mod narration;
mod report;

use analysis::{OrgLevel, PositionClassifier, SkewnessEstimator};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, Command, CompareArgs, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use dataset::PerformanceTable;
use error::AnalysisError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{
    ChartSeries, ComparisonReport, ComparisonShape, LevelSummary, LevelsReport, PerformanceRecord,
    ReportMetadata, ScoreField, SummaryReport,
};
use narration::{GapEntry, NarrationPayload, Narrator, OllamaNarrator};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit code for analysis notices.
const EXIT_NOTICE: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {:#}", e);
        std::process::exit(1);
    }

    init_logging(&args, &config);

    info!("kpicompare v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .kpicompare.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the delimiter, statistics, model, and level keywords.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration from file or use defaults.
///
/// Returns the path the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        None => Ok((Config::default(), None)),
    }
}

/// Outcome of a command that ran to completion: either a rendered
/// report or an analysis notice for the user.
type Outcome = std::result::Result<(), AnalysisError>;

/// Run the selected command. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let Some(command) = args.command.as_ref() else {
        return Ok(0);
    };

    let delimiter = config.dataset.delimiter_byte()?;
    let data_path = command.data();
    let table = dataset::load_table(data_path, delimiter)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;
    if table.is_empty() {
        warn!("Dataset {} has no usable records", data_path.display());
    }

    let metadata = ReportMetadata {
        dataset: data_path.display().to_string(),
        analysis_date: Utc::now(),
        records_loaded: table.len(),
        model_used: None,
    };

    let outcome = match command {
        Command::Supervisors { .. } => {
            list_supervisors(&table);
            Ok(())
        }
        Command::Compare(compare) => {
            run_comparison(
                ComparisonShape::Subordinates,
                compare,
                &table,
                metadata,
                &config,
                args.quiet,
            )
            .await?
        }
        Command::Peers(compare) => {
            run_comparison(
                ComparisonShape::Peers,
                compare,
                &table,
                metadata,
                &config,
                args.quiet,
            )
            .await?
        }
        Command::Levels(_) => {
            run_levels(&table, metadata, command.format(), &config)?;
            Ok(())
        }
        Command::Summary(_) => {
            run_summary(&table, metadata, command.format(), &config, args.quiet).await?;
            Ok(())
        }
    };

    match outcome {
        Ok(()) => Ok(0),
        Err(notice) => {
            warn!("Analysis stopped: {}", notice);
            eprintln!("⚠️  {}", notice.notice(config.general.language));
            Ok(EXIT_NOTICE)
        }
    }
}

/// Print the selectable supervisor ids, one per line.
fn list_supervisors(table: &PerformanceTable) {
    let ids = analysis::supervisor_ids(table);
    if ids.is_empty() {
        eprintln!("No supervisor ids found in the dataset.");
        return;
    }

    info!("Found {} supervisors", ids.len());
    for id in ids {
        println!("{}", id);
    }
}

/// Compare an anchor against its subordinates or peers and write the report.
///
/// The outer `Err` is a rendering or write failure; the inner one is an
/// analysis notice.
async fn run_comparison(
    shape: ComparisonShape,
    args: &CompareArgs,
    table: &PerformanceTable,
    mut metadata: ReportMetadata,
    config: &Config,
    quiet: bool,
) -> Result<Outcome> {
    let selected_id =
        dataset::loader::normalize_id(&args.id).unwrap_or_else(|| args.id.trim().to_string());
    let field = config.dataset.score_field;
    let estimator = config.statistics.skewness;

    let compared = match shape {
        ComparisonShape::Subordinates => {
            analysis::compare_with_subordinates(table, &selected_id, field, estimator)
        }
        ComparisonShape::Peers => analysis::compare_with_peers(table, &selected_id, field, estimator),
    };
    let comparison = match compared {
        Ok(comparison) => comparison,
        Err(notice) => return Ok(Err(notice)),
    };

    info!(
        "Compared {} against {} {} on {}",
        selected_id, comparison.result.count, comparison.shape, field
    );

    let chart = build_chart(&comparison, config);
    let field_summaries = analysis::summarize_records(&comparison.group, estimator);

    let commentary = if config.narration.enabled {
        let payload = NarrationPayload {
            subject: format!("{} of worker {}", comparison.shape, selected_id),
            shape: Some(comparison.shape),
            fields: field_summaries.clone(),
            gaps: gap_entries(comparison.anchor, &comparison.group, estimator),
            language: config.narration.language,
        };
        request_commentary(config, &payload, quiet).await
    } else {
        None
    };
    metadata.model_used = commentary
        .as_ref()
        .map(|_| config.narration.model.clone());

    let report = ComparisonReport {
        metadata,
        shape: comparison.shape,
        anchor: comparison.anchor.clone(),
        field,
        result: comparison.result,
        chart,
        field_summaries,
        commentary,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            report::generate_comparison_markdown(&report, config.general.language)
        }
    };
    write_output(&output, config)?;

    Ok(Ok(()))
}

/// Chart series of the compared field.
///
/// Curves and z-scores need a non-zero spread; without one they are
/// left out and the bars and histogram are still drawn.
fn build_chart(comparison: &analysis::Comparison<'_>, config: &Config) -> ChartSeries {
    let stats_config = &config.statistics;
    let scores = &comparison.result.subordinate_scores;

    let z_scores = match analysis::normalize_scores(scores) {
        Ok(z) => Some(z),
        Err(e) => {
            debug!("Skipping z-scores: {}", e);
            None
        }
    };

    let normal_density = analysis::normal_density_curve(
        scores,
        stats_config.density_points,
        stats_config.density_padding,
    );
    let kde = analysis::kde_curve(
        scores,
        stats_config.density_points,
        stats_config.density_padding,
    );
    if let Err(ref e) = normal_density {
        info!("Density curves omitted: {}", e);
    }

    ChartSeries {
        labels: comparison
            .members
            .iter()
            .map(|m| m.worker_id.clone())
            .collect(),
        values: comparison.members.iter().map(|m| m.score).collect(),
        z_scores,
        histogram: analysis::histogram(scores, stats_config.histogram_bins),
        normal_density: normal_density.ok(),
        kde: kde.ok(),
    }
}

/// Gap of the anchor against the group for every score field.
fn gap_entries(
    anchor: &PerformanceRecord,
    group: &[&PerformanceRecord],
    estimator: SkewnessEstimator,
) -> Vec<GapEntry> {
    ScoreField::ALL
        .iter()
        .map(|&field| {
            let scores = analysis::extract_scores(group, field);
            match analysis::compute_comparison(anchor.score(field), &scores, estimator) {
                Ok(result) => GapEntry {
                    field,
                    anchor_score: Some(result.anchor_score),
                    group_mean: Some(result.mean),
                    gap_percent: Some(result.gap_percent),
                },
                Err(e) => {
                    debug!("No gap for {}: {}", field, e);
                    GapEntry {
                        field,
                        anchor_score: anchor.score(field),
                        group_mean: analysis::stats::mean(&scores),
                        gap_percent: None,
                    }
                }
            }
        })
        .collect()
}

/// Average every score field per organizational level and write the report.
fn run_levels(
    table: &PerformanceTable,
    metadata: ReportMetadata,
    format: OutputFormat,
    config: &Config,
) -> Result<()> {
    let report = LevelsReport {
        metadata,
        levels: level_rows(table, config),
    };

    let output = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_levels_markdown(&report.metadata, &report.levels),
    };
    write_output(&output, config)
}

/// Summarize the whole dataset and write the report.
async fn run_summary(
    table: &PerformanceTable,
    mut metadata: ReportMetadata,
    format: OutputFormat,
    config: &Config,
    quiet: bool,
) -> Result<()> {
    let fields = analysis::summarize_dataset(table, config.statistics.skewness);
    let levels = level_rows(table, config);

    let commentary = if config.narration.enabled {
        let payload = NarrationPayload {
            subject: format!("all {} workers in the dataset", table.len()),
            shape: None,
            fields: fields.clone(),
            gaps: Vec::new(),
            language: config.narration.language,
        };
        request_commentary(config, &payload, quiet).await
    } else {
        None
    };
    metadata.model_used = commentary
        .as_ref()
        .map(|_| config.narration.model.clone());

    let report = SummaryReport {
        metadata,
        fields,
        levels,
        commentary,
    };

    let output = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_summary_markdown(&report),
    };
    write_output(&output, config)
}

/// Per-level means, labeled and ordered from the top of the hierarchy.
fn level_rows(table: &PerformanceTable, config: &Config) -> Vec<(String, LevelSummary)> {
    let classifier = PositionClassifier::from(&config.levels);
    analysis::compute_group_level_summary(table, |title| classifier.classify(title))
        .into_iter()
        .map(|(level, summary): (OrgLevel, LevelSummary)| (level.to_string(), summary))
        .collect()
}

/// Ask the narration service for commentary.
///
/// Failures are logged and leave the report without commentary.
async fn request_commentary(
    config: &Config,
    payload: &NarrationPayload,
    quiet: bool,
) -> Option<String> {
    let narrator = match OllamaNarrator::new(config.narration.clone()) {
        Ok(narrator) => narrator,
        Err(e) => {
            warn!("Narration unavailable: {}", e);
            return None;
        }
    };

    narrate_with_spinner(&narrator, payload, quiet).await
}

async fn narrate_with_spinner<N: Narrator>(
    narrator: &N,
    payload: &NarrationPayload,
    quiet: bool,
) -> Option<String> {
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };
    spinner.set_message(format!("Asking {} for commentary...", narrator.model_name()));

    match narrator.narrate(payload).await {
        Ok(text) => {
            spinner.finish_and_clear();
            info!("Received commentary ({} chars)", text.len());
            Some(text)
        }
        Err(e) => {
            spinner.finish_and_clear();
            warn!("Commentary skipped: {}", e);
            None
        }
    }
}

/// Write the report to the configured path, or stdout when none is set.
fn write_output(content: &str, config: &Config) -> Result<()> {
    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path))?;
            eprintln!("✅ Report saved to: {}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}
