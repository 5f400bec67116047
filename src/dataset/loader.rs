//! CSV ingestion.
//!
//! The column contract is validated once, up front: a file missing any
//! required column is rejected before a single row is read. Cells are
//! then converted into typed records. Score cells that are empty,
//! unparseable or non-finite become `None`; they are never read as zero.

use crate::dataset::PerformanceTable;
use crate::error::DatasetError;
use crate::models::PerformanceRecord;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column names every dataset must carry (case-sensitive).
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "worker_id",
    "supervisor_id",
    "position_name",
    "final_kpi_score",
    "assessment_score",
    "individual_performance_score",
];

#[derive(Debug, Deserialize)]
struct RawRow {
    worker_id: Option<String>,
    supervisor_id: Option<String>,
    position_name: Option<String>,
    final_kpi_score: Option<String>,
    assessment_score: Option<String>,
    individual_performance_score: Option<String>,
}

/// Load a performance table from a CSV file.
pub fn load_table(path: &Path, delimiter: u8) -> Result<PerformanceTable, DatasetError> {
    info!("Loading dataset: {}", path.display());

    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let table = read_table(file, delimiter)?;
    info!("Loaded {} records", table.len());
    Ok(table)
}

/// Read a performance table from any CSV source.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<PerformanceTable, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns { missing });
    }

    let mut records = Vec::new();

    for (index, row) in reader.deserialize::<RawRow>().enumerate() {
        let row = row?;
        // Header is line 1.
        let line = index + 2;

        let Some(worker_id) = row.worker_id.as_deref().and_then(normalize_id) else {
            warn!("Skipping line {}: empty worker_id", line);
            continue;
        };

        records.push(PerformanceRecord {
            worker_id,
            supervisor_id: row.supervisor_id.as_deref().and_then(normalize_id),
            position_name: row.position_name.unwrap_or_default(),
            final_kpi_score: parse_score(row.final_kpi_score.as_deref(), "final_kpi_score", line),
            assessment_score: parse_score(row.assessment_score.as_deref(), "assessment_score", line),
            individual_performance_score: parse_score(
                row.individual_performance_score.as_deref(),
                "individual_performance_score",
                line,
            ),
        });
    }

    let table = PerformanceTable::new(records);

    let duplicates = table.duplicate_worker_ids();
    if !duplicates.is_empty() {
        warn!(
            "Duplicate worker ids (first row wins): {}",
            duplicates.join(", ")
        );
    }

    Ok(table)
}

/// Normalize an identifier cell.
///
/// Spreadsheet exports often write integer ids of a column containing
/// blanks as floats (`12345.0`); those are folded back to `12345` so the
/// supervisor and worker columns stay comparable.
pub(crate) fn normalize_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(integral) = trimmed.strip_suffix(".0") {
        if !integral.is_empty() && integral.chars().all(|c| c.is_ascii_digit()) {
            return Some(integral.to_string());
        }
    }

    Some(trimmed.to_string())
}

/// Parse a score cell. Missing or malformed values are absent.
fn parse_score(raw: Option<&str>, column: &str, line: usize) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            debug!("Line {}: dropping unparseable {} '{}'", line, column, raw);
            None
        }
    }
}
