//! Data models for the KPI comparison tool.
//!
//! This module contains the core data structures used throughout
//! the application: performance records, comparison results, chart
//! series and the report envelopes handed to the renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three numeric score columns of the performance table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScoreField {
    /// `final_kpi_score` - the consolidated KPI score
    #[default]
    FinalKpiScore,
    /// `assessment_score` - the behavioural assessment score
    AssessmentScore,
    /// `individual_performance_score` - the individual target score
    IndividualPerformanceScore,
}

impl ScoreField {
    /// All score fields, in column order.
    pub const ALL: [ScoreField; 3] = [
        ScoreField::FinalKpiScore,
        ScoreField::AssessmentScore,
        ScoreField::IndividualPerformanceScore,
    ];

    /// The exact (case-sensitive) column name in the source table.
    pub fn column_name(&self) -> &'static str {
        match self {
            ScoreField::FinalKpiScore => "final_kpi_score",
            ScoreField::AssessmentScore => "assessment_score",
            ScoreField::IndividualPerformanceScore => "individual_performance_score",
        }
    }

    /// Human readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            ScoreField::FinalKpiScore => "Final KPI Score",
            ScoreField::AssessmentScore => "Assessment Score",
            ScoreField::IndividualPerformanceScore => "Individual Performance Score",
        }
    }
}

impl fmt::Display for ScoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

impl FromStr for ScoreField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "final_kpi_score" | "kpi" => Ok(ScoreField::FinalKpiScore),
            "assessment_score" | "assessment" => Ok(ScoreField::AssessmentScore),
            "individual_performance_score" | "individual" => {
                Ok(ScoreField::IndividualPerformanceScore)
            }
            other => Err(format!(
                "Unknown score field '{}'. Expected one of: final_kpi_score, assessment_score, individual_performance_score",
                other
            )),
        }
    }
}

/// Language used for user-facing notices and narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    /// English (default)
    #[default]
    #[serde(rename = "en")]
    English,
    /// Bahasa Indonesia
    #[serde(rename = "id")]
    Indonesian,
}

impl Language {
    /// Name of the language as it should appear in a prompt.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Indonesian => "Bahasa Indonesia",
        }
    }
}

/// One row of the performance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Identifier of the worker.
    pub worker_id: String,
    /// Identifier of the worker's supervisor (absent at the top of the hierarchy).
    pub supervisor_id: Option<String>,
    /// Free-text position title.
    pub position_name: String,
    /// Final KPI score, absent when missing or unparseable.
    pub final_kpi_score: Option<f64>,
    /// Assessment score, absent when missing or unparseable.
    pub assessment_score: Option<f64>,
    /// Individual performance score, absent when missing or unparseable.
    pub individual_performance_score: Option<f64>,
}

impl PerformanceRecord {
    /// Returns the value of the given score field, if present.
    pub fn score(&self, field: ScoreField) -> Option<f64> {
        match field {
            ScoreField::FinalKpiScore => self.final_kpi_score,
            ScoreField::AssessmentScore => self.assessment_score,
            ScoreField::IndividualPerformanceScore => self.individual_performance_score,
        }
    }
}

/// Shape classification derived from the skewness coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkewCategory {
    LeftSkewed,
    RightSkewed,
    Symmetric,
}

impl SkewCategory {
    /// Classify a skewness coefficient. Exactly +/-0.5 is symmetric.
    pub fn classify(skewness: f64) -> Self {
        if skewness < -0.5 {
            SkewCategory::LeftSkewed
        } else if skewness > 0.5 {
            SkewCategory::RightSkewed
        } else {
            SkewCategory::Symmetric
        }
    }

    /// Localized label.
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (SkewCategory::LeftSkewed, Language::English) => "Left skewed",
            (SkewCategory::RightSkewed, Language::English) => "Right skewed",
            (SkewCategory::Symmetric, Language::English) => "Normal / symmetric",
            (SkewCategory::LeftSkewed, Language::Indonesian) => "Skew kiri",
            (SkewCategory::RightSkewed, Language::Indonesian) => "Skew kanan",
            (SkewCategory::Symmetric, Language::Indonesian) => "Normal / simetris",
        }
    }
}

impl fmt::Display for SkewCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label(Language::English))
    }
}

/// Which group the anchor is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonShape {
    /// Supervisor against the workers reporting to them.
    Subordinates,
    /// Worker against the other workers sharing their supervisor.
    Peers,
}

impl fmt::Display for ComparisonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonShape::Subordinates => write!(f, "subordinates"),
            ComparisonShape::Peers => write!(f, "peers"),
        }
    }
}

/// Statistics of a comparison group relative to the anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// The anchor's own score.
    pub anchor_score: f64,
    /// Present scores of the comparison group, in table order.
    pub subordinate_scores: Vec<f64>,
    /// Number of scores in the group.
    pub count: usize,
    /// Smallest group score.
    pub min: f64,
    /// Largest group score.
    pub max: f64,
    /// Arithmetic mean of the group.
    pub mean: f64,
    /// Sample standard deviation (ddof = 1); `None` with fewer than 2 values.
    pub std_dev: Option<f64>,
    /// Skewness coefficient; `None` when undefined.
    pub skewness: Option<f64>,
    /// Shape classification; `None` when skewness is undefined.
    pub skew_category: Option<SkewCategory>,
    /// `(anchor - mean) / mean * 100`.
    pub gap_percent: f64,
}

/// A score with the worker it belongs to, for labeling chart bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledScore {
    pub worker_id: String,
    pub score: f64,
}

/// One equal-width histogram bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// A sampled probability density curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Descriptive statistics of one score field over a set of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub field: ScoreField,
    /// Records with a present value.
    pub count: usize,
    /// Records with a missing or unparseable value.
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub skewness: Option<f64>,
}

/// Per-field means of one organizational level.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelSummary {
    /// Number of records classified into the level.
    pub members: usize,
    pub final_kpi_score: Option<f64>,
    pub assessment_score: Option<f64>,
    pub individual_performance_score: Option<f64>,
}

impl LevelSummary {
    /// Mean of the given field within the level.
    pub fn mean(&self, field: ScoreField) -> Option<f64> {
        match field {
            ScoreField::FinalKpiScore => self.final_kpi_score,
            ScoreField::AssessmentScore => self.assessment_score,
            ScoreField::IndividualPerformanceScore => self.individual_performance_score,
        }
    }
}

/// Metadata about a generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the dataset the report was computed from.
    pub dataset: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Number of records in the dataset.
    pub records_loaded: usize,
    /// Name of the narration model, when commentary was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

/// Chart-ready series for a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Worker ids, matching `values` position by position.
    pub labels: Vec<String>,
    /// Scores of the comparison group.
    pub values: Vec<f64>,
    /// Standardized `values`, absent when the spread is zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_scores: Option<Vec<f64>>,
    /// Histogram of the group scores.
    pub histogram: Vec<HistogramBin>,
    /// Fitted normal density, absent when the spread is zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_density: Option<DensityCurve>,
    /// Kernel density estimate, absent when the spread is zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kde: Option<DensityCurve>,
}

/// Report of an anchor-versus-group comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub metadata: ReportMetadata,
    pub shape: ComparisonShape,
    /// The selected worker.
    pub anchor: PerformanceRecord,
    /// The score field the comparison was computed on.
    pub field: ScoreField,
    pub result: ComparisonResult,
    pub chart: ChartSeries,
    /// Group statistics for every score field, for context.
    pub field_summaries: Vec<FieldSummary>,
    /// Free-text commentary from the narration service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

/// Report of the whole dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub metadata: ReportMetadata,
    pub fields: Vec<FieldSummary>,
    /// Per-level means, keyed by level label.
    pub levels: Vec<(String, LevelSummary)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
}

/// Report of per-level means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelsReport {
    pub metadata: ReportMetadata,
    /// Per-level means, ordered from the top of the hierarchy down.
    pub levels: Vec<(String, LevelSummary)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(final_kpi: Option<f64>) -> PerformanceRecord {
        PerformanceRecord {
            worker_id: "1001".to_string(),
            supervisor_id: None,
            position_name: "Manager".to_string(),
            final_kpi_score: final_kpi,
            assessment_score: Some(70.0),
            individual_performance_score: None,
        }
    }

    #[test]
    fn test_score_field_lookup() {
        let rec = record(Some(88.5));
        assert_eq!(rec.score(ScoreField::FinalKpiScore), Some(88.5));
        assert_eq!(rec.score(ScoreField::AssessmentScore), Some(70.0));
        assert_eq!(rec.score(ScoreField::IndividualPerformanceScore), None);
    }

    #[test]
    fn test_score_field_from_str() {
        assert_eq!(
            "final_kpi_score".parse::<ScoreField>(),
            Ok(ScoreField::FinalKpiScore)
        );
        assert_eq!(
            "individual-performance-score".parse::<ScoreField>(),
            Ok(ScoreField::IndividualPerformanceScore)
        );
        assert!("salary".parse::<ScoreField>().is_err());
    }

    #[test]
    fn test_skew_category_thresholds() {
        assert_eq!(SkewCategory::classify(-0.51), SkewCategory::LeftSkewed);
        assert_eq!(SkewCategory::classify(-0.5), SkewCategory::Symmetric);
        assert_eq!(SkewCategory::classify(0.0), SkewCategory::Symmetric);
        assert_eq!(SkewCategory::classify(0.5), SkewCategory::Symmetric);
        assert_eq!(SkewCategory::classify(0.51), SkewCategory::RightSkewed);
    }

    #[test]
    fn test_skew_category_labels() {
        assert_eq!(
            SkewCategory::LeftSkewed.label(Language::Indonesian),
            "Skew kiri"
        );
        assert_eq!(SkewCategory::RightSkewed.to_string(), "Right skewed");
    }

    #[test]
    fn test_skew_category_serializes_screaming_case() {
        let json = serde_json::to_string(&SkewCategory::LeftSkewed).unwrap();
        assert_eq!(json, "\"LEFT_SKEWED\"");
    }
}
