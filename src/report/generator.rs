//! Markdown report generation.
//!
//! This module generates Markdown reports from comparison and
//! summary results, plus their JSON counterparts for renderers.

use crate::models::{
    ComparisonReport, ComparisonShape, FieldSummary, HistogramBin, Language, LevelSummary,
    ReportMetadata, ScoreField, SummaryReport,
};
use anyhow::Result;
use serde::Serialize;

/// Generate a complete Markdown comparison report.
pub fn generate_comparison_markdown(report: &ComparisonReport, language: Language) -> String {
    let mut output = String::new();

    let title = match report.shape {
        ComparisonShape::Subordinates => "Supervisor vs. Subordinates KPI Comparison",
        ComparisonShape::Peers => "Worker vs. Peers KPI Comparison",
    };
    output.push_str(&format!("# {}\n\n", title));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_anchor_section(report));
    output.push_str(&generate_statistics_section(report, language));
    output.push_str(&generate_members_section(report));
    output.push_str(&generate_histogram_section(&report.chart.histogram));
    output.push_str(&generate_field_table(
        "Group Statistics by Field",
        &report.field_summaries,
    ));
    output.push_str(&generate_commentary_section(report.commentary.as_deref()));
    output.push_str(&generate_footer());

    output
}

/// Generate a complete Markdown dataset summary report.
pub fn generate_summary_markdown(report: &SummaryReport) -> String {
    let mut output = String::new();

    output.push_str("# KPI Dataset Summary\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_field_table("Score Fields", &report.fields));
    output.push_str(&generate_levels_section(&report.levels));
    output.push_str(&generate_commentary_section(report.commentary.as_deref()));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** {}\n", metadata.dataset));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records Loaded:** {}\n",
        metadata.records_loaded
    ));
    if let Some(ref model) = metadata.model_used {
        section.push_str(&format!("- **Commentary Model:** `{}`\n", model));
    }
    section.push('\n');

    section
}

fn generate_anchor_section(report: &ComparisonReport) -> String {
    let mut section = String::new();
    let anchor = &report.anchor;

    section.push_str("## Anchor\n\n");
    section.push_str(&format!("- **Worker ID:** {}\n", anchor.worker_id));
    if !anchor.position_name.is_empty() {
        section.push_str(&format!("- **Position:** {}\n", anchor.position_name));
    }
    if let Some(ref supervisor) = anchor.supervisor_id {
        section.push_str(&format!("- **Supervisor ID:** {}\n", supervisor));
    }
    section.push_str(&format!("- **Compared Field:** `{}`\n", report.field));
    section.push_str(&format!("- **Compared Against:** {}\n\n", report.shape));

    section
}

fn generate_statistics_section(report: &ComparisonReport, language: Language) -> String {
    let mut section = String::new();
    let result = &report.result;

    let skew = match (result.skewness, result.skew_category) {
        (Some(value), Some(category)) => format!("{:.2} ({})", value, category.label(language)),
        _ => "undefined (too few values or no spread)".to_string(),
    };

    section.push_str("## Statistics\n\n");
    section.push_str("| Metric | Value |\n");
    section.push_str("|:---|---:|\n");
    section.push_str(&format!("| Anchor score | {:.2} |\n", result.anchor_score));
    section.push_str(&format!("| Group size | {} |\n", result.count));
    section.push_str(&format!("| Group mean | {:.2} |\n", result.mean));
    section.push_str(&format!(
        "| Standard deviation | {} |\n",
        fmt_opt(result.std_dev)
    ));
    section.push_str(&format!("| Min / Max | {:.2} / {:.2} |\n", result.min, result.max));
    section.push_str(&format!("| Skewness | {} |\n", skew));
    section.push_str(&format!("| **Gap** | **{:+.2}%** |\n\n", result.gap_percent));

    section
}

fn generate_members_section(report: &ComparisonReport) -> String {
    let mut section = String::new();

    section.push_str("## Group Scores\n\n");
    section.push_str("| Worker ID | Score | vs. Anchor |\n");
    section.push_str("|:---|---:|---:|\n");

    for (label, value) in report.chart.labels.iter().zip(&report.chart.values) {
        section.push_str(&format!(
            "| {} | {:.2} | {:+.2} |\n",
            label,
            value,
            value - report.result.anchor_score
        ));
    }
    section.push('\n');

    section
}

fn generate_histogram_section(bins: &[HistogramBin]) -> String {
    if bins.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Distribution\n\n");
    section.push_str("| Range | Count | |\n");
    section.push_str("|:---|---:|:---|\n");

    for bin in bins {
        section.push_str(&format!(
            "| {:.1} - {:.1} | {} | {} |\n",
            bin.lower,
            bin.upper,
            bin.count,
            "#".repeat(bin.count)
        ));
    }
    section.push('\n');

    section
}

fn generate_field_table(title: &str, fields: &[FieldSummary]) -> String {
    if fields.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str(&format!("## {}\n\n", title));
    section.push_str("| Field | Count | Missing | Min | Max | Mean | Std Dev | Skewness |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|---:|---:|\n");

    for summary in fields {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            summary.field.label(),
            summary.count,
            summary.missing,
            fmt_opt(summary.min),
            fmt_opt(summary.max),
            fmt_opt(summary.mean),
            fmt_opt(summary.std_dev),
            fmt_opt(summary.skewness),
        ));
    }
    section.push('\n');

    section
}

fn generate_levels_section(levels: &[(String, LevelSummary)]) -> String {
    if levels.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Organizational Levels\n\n");
    section.push_str("| Level | Members |");
    for field in ScoreField::ALL {
        section.push_str(&format!(" {} |", field.label()));
    }
    section.push_str("\n|:---|---:|---:|---:|---:|\n");

    for (label, summary) in levels {
        section.push_str(&format!("| {} | {} |", label, summary.members));
        for field in ScoreField::ALL {
            section.push_str(&format!(" {} |", fmt_opt(summary.mean(field))));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_commentary_section(commentary: Option<&str>) -> String {
    match commentary {
        Some(text) if !text.trim().is_empty() => format!("## Commentary\n\n{}\n\n", text.trim()),
        _ => String::new(),
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by kpicompare*\n".to_string()
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

/// Generate a pretty-printed JSON report.
pub fn generate_json_report<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Generate a Markdown level table on its own.
pub fn generate_levels_markdown(metadata: &ReportMetadata, levels: &[(String, LevelSummary)]) -> String {
    let mut output = String::new();

    output.push_str("# KPI by Organizational Level\n\n");
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_levels_section(levels));
    output.push_str(&generate_footer());

    output
}
