//! Error types.
//!
//! `AnalysisError` covers the expected conditions of a comparison
//! (unknown id, not enough data, undefined division). They are
//! recoverable: callers show a notice and skip dependent output.

use crate::models::Language;
use std::path::PathBuf;
use thiserror::Error;

/// Why a computation did not have enough data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientReason {
    /// The comparison group has no present score.
    EmptyGroup,
    /// The anchor record exists but its score is missing.
    MissingAnchorScore,
    /// No values were supplied at all.
    EmptyInput,
}

/// Which computation would have divided by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionContext {
    /// Gap percentage with a group mean of zero.
    GapPercent,
    /// z-score normalization with zero spread.
    Normalization,
    /// Density curve with zero spread.
    DensityCurve,
}

/// Expected, recoverable conditions of the comparison pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("no record with worker_id '{id}'")]
    NotFound { id: String },

    #[error("insufficient data: {}", reason_text(.reason))]
    InsufficientData { reason: InsufficientReason },

    #[error("division undefined: {}", context_text(.context))]
    DivisionUndefined { context: DivisionContext },
}

fn reason_text(reason: &InsufficientReason) -> &'static str {
    match reason {
        InsufficientReason::EmptyGroup => "comparison group has no scores",
        InsufficientReason::MissingAnchorScore => "anchor score is missing",
        InsufficientReason::EmptyInput => "no values supplied",
    }
}

fn context_text(context: &DivisionContext) -> &'static str {
    match context {
        DivisionContext::GapPercent => "group mean is zero",
        DivisionContext::Normalization => "standard deviation is zero or undefined",
        DivisionContext::DensityCurve => "scores have no spread",
    }
}

impl AnalysisError {
    pub fn insufficient(reason: InsufficientReason) -> Self {
        AnalysisError::InsufficientData { reason }
    }

    pub fn division(context: DivisionContext) -> Self {
        AnalysisError::DivisionUndefined { context }
    }

    /// A short notice suitable for showing to the user.
    pub fn notice(&self, language: Language) -> String {
        match (self, language) {
            (AnalysisError::NotFound { id }, Language::English) => {
                format!("No worker record found for id {}.", id)
            }
            (AnalysisError::NotFound { id }, Language::Indonesian) => {
                format!("Data pekerja dengan NIPP {} tidak ditemukan.", id)
            }
            (AnalysisError::InsufficientData { reason }, Language::English) => match reason {
                InsufficientReason::EmptyGroup => {
                    "No comparison data is available for this id.".to_string()
                }
                InsufficientReason::MissingAnchorScore => {
                    "The selected worker has no score for this field.".to_string()
                }
                InsufficientReason::EmptyInput => "No scores to analyze.".to_string(),
            },
            (AnalysisError::InsufficientData { reason }, Language::Indonesian) => match reason {
                InsufficientReason::EmptyGroup => {
                    "Tidak ada data pembanding untuk NIPP ini.".to_string()
                }
                InsufficientReason::MissingAnchorScore => {
                    "Pekerja yang dipilih tidak memiliki skor untuk kolom ini.".to_string()
                }
                InsufficientReason::EmptyInput => "Tidak ada skor untuk dianalisis.".to_string(),
            },
            (AnalysisError::DivisionUndefined { context }, Language::English) => match context {
                DivisionContext::GapPercent => {
                    "The gap cannot be computed because the group average is zero.".to_string()
                }
                DivisionContext::Normalization | DivisionContext::DensityCurve => {
                    "All scores are identical, so they cannot be normalized.".to_string()
                }
            },
            (AnalysisError::DivisionUndefined { context }, Language::Indonesian) => match context {
                DivisionContext::GapPercent => {
                    "Gap tidak dapat dihitung karena rata-rata kelompok bernilai nol.".to_string()
                }
                DivisionContext::Normalization | DivisionContext::DensityCurve => {
                    "Semua skor identik sehingga tidak dapat dinormalisasi.".to_string()
                }
            },
        }
    }
}

/// Failures while loading the performance table.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

/// Failures of the narration service.
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("cannot connect to narration service at {0}")]
    Connect(String),

    #[error("narration API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to send request: {0}")]
    Request(String),

    #[error("failed to decode narration response: {0}")]
    Decode(String),
}

impl NarrationError {
    /// Whether another attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            NarrationError::Timeout(_) | NarrationError::Connect(_) => true,
            NarrationError::Api { status, .. } => *status >= 500,
            NarrationError::Request(_) | NarrationError::Decode(_) => false,
        }
    }
}
