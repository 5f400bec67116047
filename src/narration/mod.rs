//! Narrative commentary on computed statistics.
//!
//! The statistics core never talks to the network. It hands a
//! [`NarrationPayload`] to a [`Narrator`], and whatever text comes back
//! is shown as-is: it is never parsed or fed into another computation.

pub mod ollama;

pub use ollama::OllamaNarrator;

use crate::error::NarrationError;
use crate::models::{ComparisonShape, FieldSummary, Language, ScoreField};
use serde::Serialize;
use std::fmt::Write;

/// Something that turns a numeric summary into prose.
#[allow(async_fn_in_trait)]
pub trait Narrator {
    /// Name of the backing model, for report metadata.
    fn model_name(&self) -> &str;

    /// Produce commentary for the payload.
    async fn narrate(&self, payload: &NarrationPayload) -> Result<String, NarrationError>;
}

/// Gap of the anchor against the group mean for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapEntry {
    pub field: ScoreField,
    pub anchor_score: Option<f64>,
    pub group_mean: Option<f64>,
    pub gap_percent: Option<f64>,
}

/// Structured input for the narration service.
#[derive(Debug, Clone, Serialize)]
pub struct NarrationPayload {
    /// What the numbers describe, e.g. "subordinates of 1001".
    pub subject: String,
    /// Comparison shape, absent for dataset-wide summaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<ComparisonShape>,
    pub fields: Vec<FieldSummary>,
    pub gaps: Vec<GapEntry>,
    pub language: Language,
}

impl NarrationPayload {
    /// Render the payload as a plain-text prompt.
    pub fn to_prompt(&self) -> String {
        let mut prompt = String::new();

        let _ = writeln!(prompt, "Subject: {}", self.subject);
        if let Some(shape) = self.shape {
            let _ = writeln!(prompt, "Comparison group: {}", shape);
        }
        let _ = writeln!(prompt);
        let _ = writeln!(prompt, "Score statistics:");

        for summary in &self.fields {
            let _ = writeln!(
                prompt,
                "- {}: n={}, min={}, max={}, mean={}, skewness={}",
                summary.field.column_name(),
                summary.count,
                fmt_opt(summary.min),
                fmt_opt(summary.max),
                fmt_opt(summary.mean),
                fmt_opt(summary.skewness),
            );
        }

        if !self.gaps.is_empty() {
            let _ = writeln!(prompt);
            let _ = writeln!(prompt, "Anchor versus group mean:");
            for gap in &self.gaps {
                let _ = writeln!(
                    prompt,
                    "- {}: anchor={}, group mean={}, gap={}%",
                    gap.field.column_name(),
                    fmt_opt(gap.anchor_score),
                    fmt_opt(gap.group_mean),
                    fmt_opt(gap.gap_percent),
                );
            }
        }

        let _ = writeln!(prompt);
        let _ = write!(
            prompt,
            "Write a short analysis of these results in {}. Explain the distribution shape, \
             how the anchor compares with the group, and one practical recommendation.",
            self.language.prompt_name()
        );

        prompt
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}
