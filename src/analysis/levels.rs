//! Organizational level grouping.
//!
//! Position titles are free text. A fixed keyword matcher folds them
//! into a small set of levels, and per-level means are computed for
//! every score field.

use crate::analysis::stats;
use crate::config::LevelsConfig;
use crate::dataset::PerformanceTable;
use crate::models::{LevelSummary, ScoreField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Organizational level, ordered from the top of the hierarchy down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgLevel {
    Executive,
    Manager,
    Supervisor,
    Staff,
}

impl fmt::Display for OrgLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrgLevel::Executive => write!(f, "Executive"),
            OrgLevel::Manager => write!(f, "Manager"),
            OrgLevel::Supervisor => write!(f, "Supervisor"),
            OrgLevel::Staff => write!(f, "Staff"),
        }
    }
}

/// Case-insensitive substring matcher from position title to level.
#[derive(Debug, Clone)]
pub struct PositionClassifier {
    executive: Vec<String>,
    manager: Vec<String>,
    supervisor: Vec<String>,
}

impl PositionClassifier {
    pub fn new(executive: Vec<String>, manager: Vec<String>, supervisor: Vec<String>) -> Self {
        let lower = |words: Vec<String>| -> Vec<String> {
            words
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };

        Self {
            executive: lower(executive),
            manager: lower(manager),
            supervisor: lower(supervisor),
        }
    }

    /// Classify a title. Executive keywords are checked first, then
    /// manager, then supervisor; anything else is staff.
    pub fn classify(&self, position_name: &str) -> OrgLevel {
        let title = position_name.to_lowercase();
        let matches = |keywords: &[String]| keywords.iter().any(|k| title.contains(k.as_str()));

        if matches(&self.executive) {
            OrgLevel::Executive
        } else if matches(&self.manager) {
            OrgLevel::Manager
        } else if matches(&self.supervisor) {
            OrgLevel::Supervisor
        } else {
            OrgLevel::Staff
        }
    }
}

impl Default for PositionClassifier {
    fn default() -> Self {
        Self::from(&LevelsConfig::default())
    }
}

impl From<&LevelsConfig> for PositionClassifier {
    fn from(config: &LevelsConfig) -> Self {
        Self::new(
            config.executive.clone(),
            config.manager.clone(),
            config.supervisor.clone(),
        )
    }
}

/// Partition the table with `classify` and average every score field
/// within each partition.
pub fn compute_group_level_summary<L, F>(
    table: &PerformanceTable,
    classify: F,
) -> BTreeMap<L, LevelSummary>
where
    L: Ord,
    F: Fn(&str) -> L,
{
    let mut partitions: BTreeMap<L, Vec<usize>> = BTreeMap::new();
    for (index, record) in table.records().iter().enumerate() {
        partitions
            .entry(classify(&record.position_name))
            .or_default()
            .push(index);
    }

    partitions
        .into_iter()
        .map(|(level, indices)| {
            let field_mean = |field: ScoreField| {
                let values: Vec<f64> = indices
                    .iter()
                    .filter_map(|&i| table.records()[i].score(field))
                    .collect();
                stats::mean(&values)
            };

            let summary = LevelSummary {
                members: indices.len(),
                final_kpi_score: field_mean(ScoreField::FinalKpiScore),
                assessment_score: field_mean(ScoreField::AssessmentScore),
                individual_performance_score: field_mean(ScoreField::IndividualPerformanceScore),
            };
            (level, summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PerformanceRecord;

    fn record(position: &str, kpi: Option<f64>, assessment: Option<f64>) -> PerformanceRecord {
        PerformanceRecord {
            worker_id: position.to_string(),
            supervisor_id: None,
            position_name: position.to_string(),
            final_kpi_score: kpi,
            assessment_score: assessment,
            individual_performance_score: None,
        }
    }

    #[test]
    fn test_default_classifier() {
        let classifier = PositionClassifier::default();
        assert_eq!(classifier.classify("Direktur Utama"), OrgLevel::Executive);
        assert_eq!(classifier.classify("DIRECTOR OF FINANCE"), OrgLevel::Executive);
        assert_eq!(classifier.classify("Manager Keuangan"), OrgLevel::Manager);
        assert_eq!(classifier.classify("Kepala Divisi SDM"), OrgLevel::Manager);
        assert_eq!(classifier.classify("Supervisor Gudang"), OrgLevel::Supervisor);
        assert_eq!(classifier.classify("Staf Administrasi"), OrgLevel::Staff);
        assert_eq!(classifier.classify(""), OrgLevel::Staff);
    }

    #[test]
    fn test_executive_marker_wins_over_manager() {
        let classifier = PositionClassifier::default();
        assert_eq!(
            classifier.classify("Direktur Operasi dan Manager Proyek"),
            OrgLevel::Executive
        );
    }

    #[test]
    fn test_custom_keywords() {
        let classifier = PositionClassifier::new(
            vec!["Chief".to_string()],
            vec!["Lead ".to_string(), "  ".to_string()],
            vec![],
        );
        assert_eq!(classifier.classify("chief data officer"), OrgLevel::Executive);
        assert_eq!(classifier.classify("Lead Engineer"), OrgLevel::Manager);
        assert_eq!(classifier.classify("Engineer"), OrgLevel::Staff);
    }

    #[test]
    fn test_group_level_summary_means() {
        let table = PerformanceTable::new(vec![
            record("Direktur Utama", Some(90.0), Some(80.0)),
            record("Manager A", Some(80.0), None),
            record("Manager B", Some(70.0), Some(60.0)),
            record("Staf", None, None),
        ]);

        let classifier = PositionClassifier::default();
        let summary = compute_group_level_summary(&table, |p| classifier.classify(p));

        let levels: Vec<_> = summary.keys().copied().collect();
        assert_eq!(
            levels,
            vec![OrgLevel::Executive, OrgLevel::Manager, OrgLevel::Staff]
        );

        let managers = &summary[&OrgLevel::Manager];
        assert_eq!(managers.members, 2);
        assert_eq!(managers.final_kpi_score, Some(75.0));
        assert_eq!(managers.assessment_score, Some(60.0));
        assert_eq!(managers.individual_performance_score, None);

        let staff = &summary[&OrgLevel::Staff];
        assert_eq!(staff.members, 1);
        assert_eq!(staff.mean(ScoreField::FinalKpiScore), None);
    }

    #[test]
    fn test_group_level_summary_with_custom_partition() {
        let table = PerformanceTable::new(vec![
            record("alpha", Some(10.0), None),
            record("beta", Some(20.0), None),
            record("alpine", Some(30.0), None),
        ]);

        let summary = compute_group_level_summary(&table, |p| p.starts_with("al"));
        assert_eq!(summary[&true].final_kpi_score, Some(20.0));
        assert_eq!(summary[&false].final_kpi_score, Some(20.0));
        assert_eq!(summary[&true].members, 2);
    }
}
