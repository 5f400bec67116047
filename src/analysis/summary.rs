//! Dataset-wide field summaries.

use crate::analysis::stats::{self, SkewnessEstimator};
use crate::dataset::PerformanceTable;
use crate::models::{FieldSummary, PerformanceRecord, ScoreField};

/// Summarize one field over a set of records.
pub fn summarize_field(
    records: &[&PerformanceRecord],
    field: ScoreField,
    estimator: SkewnessEstimator,
) -> FieldSummary {
    let values: Vec<f64> = records.iter().filter_map(|r| r.score(field)).collect();
    let (min, max) = match stats::min_max(&values) {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };

    FieldSummary {
        field,
        count: values.len(),
        missing: records.len() - values.len(),
        min,
        max,
        mean: stats::mean(&values),
        std_dev: stats::sample_std_dev(&values),
        skewness: stats::skewness(&values, estimator),
    }
}

/// Summaries of every score field over a set of records, in column order.
pub fn summarize_records(
    records: &[&PerformanceRecord],
    estimator: SkewnessEstimator,
) -> Vec<FieldSummary> {
    ScoreField::ALL
        .iter()
        .map(|&field| summarize_field(records, field, estimator))
        .collect()
}

/// Summaries of every score field over the whole table.
pub fn summarize_dataset(
    table: &PerformanceTable,
    estimator: SkewnessEstimator,
) -> Vec<FieldSummary> {
    let records: Vec<&PerformanceRecord> = table.records().iter().collect();
    summarize_records(&records, estimator)
}
