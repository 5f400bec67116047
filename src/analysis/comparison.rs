//! Anchor-versus-group comparison.
//!
//! Resolves the selected worker (the anchor) and the group it is
//! compared against, extracts the present scores and computes the
//! comparison statistics.

use crate::analysis::stats::{self, SkewnessEstimator};
use crate::dataset::PerformanceTable;
use crate::error::{AnalysisError, DivisionContext, InsufficientReason};
use crate::models::{
    ComparisonResult, ComparisonShape, LabeledScore, PerformanceRecord, ScoreField, SkewCategory,
};
use tracing::debug;

/// A resolved comparison: anchor, group members and statistics.
#[derive(Debug, Clone)]
pub struct Comparison<'a> {
    pub shape: ComparisonShape,
    pub anchor: &'a PerformanceRecord,
    /// Every record of the group, including those missing the compared field.
    pub group: Vec<&'a PerformanceRecord>,
    /// Group members with a present score, in table order.
    pub members: Vec<LabeledScore>,
    pub result: ComparisonResult,
}

/// First record whose `worker_id` equals `selected_id`.
pub fn resolve_anchor<'a>(
    table: &'a PerformanceTable,
    selected_id: &str,
) -> Result<&'a PerformanceRecord, AnalysisError> {
    table
        .records()
        .iter()
        .find(|r| r.worker_id == selected_id)
        .ok_or_else(|| AnalysisError::NotFound {
            id: selected_id.to_string(),
        })
}

/// All records reporting to `selected_id`, in table order.
pub fn resolve_subordinates<'a>(
    table: &'a PerformanceTable,
    selected_id: &str,
) -> Vec<&'a PerformanceRecord> {
    table
        .records()
        .iter()
        .filter(|r| r.supervisor_id.as_deref() == Some(selected_id))
        .collect()
}

/// Records sharing the anchor's supervisor, excluding the anchor itself.
///
/// An anchor at the top of the hierarchy has no peers.
#[allow(dead_code)] // Standalone lookup; compare_with_peers reuses its resolved anchor
pub fn resolve_peers<'a>(
    table: &'a PerformanceTable,
    selected_id: &str,
) -> Result<Vec<&'a PerformanceRecord>, AnalysisError> {
    let anchor = resolve_anchor(table, selected_id)?;
    Ok(peers_of(table, anchor))
}

fn peers_of<'a>(
    table: &'a PerformanceTable,
    anchor: &PerformanceRecord,
) -> Vec<&'a PerformanceRecord> {
    let Some(supervisor) = anchor.supervisor_id.as_deref() else {
        return Vec::new();
    };

    resolve_subordinates(table, supervisor)
        .into_iter()
        .filter(|r| r.worker_id != anchor.worker_id)
        .collect()
}

/// Sorted, de-duplicated supervisor ids present in the table.
pub fn supervisor_ids(table: &PerformanceTable) -> Vec<&str> {
    let mut ids: Vec<&str> = table
        .records()
        .iter()
        .filter_map(|r| r.supervisor_id.as_deref())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Present values of `field`, in record order.
///
/// Records with a missing value are dropped; they are never counted
/// as zero.
pub fn extract_scores(records: &[&PerformanceRecord], field: ScoreField) -> Vec<f64> {
    records.iter().filter_map(|r| r.score(field)).collect()
}

/// Like [`extract_scores`], keeping the worker id with each score.
pub fn extract_labeled_scores(
    records: &[&PerformanceRecord],
    field: ScoreField,
) -> Vec<LabeledScore> {
    records
        .iter()
        .filter_map(|r| {
            r.score(field).map(|score| LabeledScore {
                worker_id: r.worker_id.clone(),
                score,
            })
        })
        .collect()
}

/// Compare an anchor score against a group of scores.
pub fn compute_comparison(
    anchor_score: Option<f64>,
    subordinate_scores: &[f64],
    estimator: SkewnessEstimator,
) -> Result<ComparisonResult, AnalysisError> {
    if subordinate_scores.is_empty() {
        return Err(AnalysisError::insufficient(InsufficientReason::EmptyGroup));
    }
    let anchor_score = anchor_score
        .ok_or_else(|| AnalysisError::insufficient(InsufficientReason::MissingAnchorScore))?;

    let mean = stats::mean(subordinate_scores)
        .ok_or_else(|| AnalysisError::insufficient(InsufficientReason::EmptyGroup))?;
    let (min, max) = stats::min_max(subordinate_scores)
        .ok_or_else(|| AnalysisError::insufficient(InsufficientReason::EmptyGroup))?;

    // A zero or subnormal mean would yield an infinite or NaN gap.
    let gap_percent = (anchor_score - mean) / mean * 100.0;
    if mean == 0.0 || !gap_percent.is_finite() {
        return Err(AnalysisError::division(DivisionContext::GapPercent));
    }

    let skewness = stats::skewness(subordinate_scores, estimator);

    Ok(ComparisonResult {
        anchor_score,
        subordinate_scores: subordinate_scores.to_vec(),
        count: subordinate_scores.len(),
        min,
        max,
        mean,
        std_dev: stats::sample_std_dev(subordinate_scores),
        skewness,
        skew_category: skewness.map(SkewCategory::classify),
        gap_percent,
    })
}

/// Compare a supervisor against the workers reporting to them.
pub fn compare_with_subordinates<'a>(
    table: &'a PerformanceTable,
    selected_id: &str,
    field: ScoreField,
    estimator: SkewnessEstimator,
) -> Result<Comparison<'a>, AnalysisError> {
    let anchor = resolve_anchor(table, selected_id)?;
    let group = resolve_subordinates(table, selected_id);
    debug!(
        "Resolved {} subordinates for {}",
        group.len(),
        selected_id
    );
    build_comparison(ComparisonShape::Subordinates, anchor, group, field, estimator)
}

/// Compare a worker against the peers sharing their supervisor.
pub fn compare_with_peers<'a>(
    table: &'a PerformanceTable,
    selected_id: &str,
    field: ScoreField,
    estimator: SkewnessEstimator,
) -> Result<Comparison<'a>, AnalysisError> {
    let anchor = resolve_anchor(table, selected_id)?;
    let group = peers_of(table, anchor);
    debug!("Resolved {} peers for {}", group.len(), selected_id);
    build_comparison(ComparisonShape::Peers, anchor, group, field, estimator)
}

fn build_comparison<'a>(
    shape: ComparisonShape,
    anchor: &'a PerformanceRecord,
    group: Vec<&'a PerformanceRecord>,
    field: ScoreField,
    estimator: SkewnessEstimator,
) -> Result<Comparison<'a>, AnalysisError> {
    let members = extract_labeled_scores(&group, field);
    let scores: Vec<f64> = members.iter().map(|m| m.score).collect();
    let result = compute_comparison(anchor.score(field), &scores, estimator)?;

    Ok(Comparison {
        shape,
        anchor,
        group,
        members,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, supervisor: Option<&str>, score: Option<f64>) -> PerformanceRecord {
        PerformanceRecord {
            worker_id: id.to_string(),
            supervisor_id: supervisor.map(String::from),
            position_name: "Staff".to_string(),
            final_kpi_score: score,
            assessment_score: None,
            individual_performance_score: None,
        }
    }

    fn scenario_table() -> PerformanceTable {
        PerformanceTable::new(vec![
            record("1", None, Some(90.0)),
            record("2", Some("1"), Some(80.0)),
            record("3", Some("1"), Some(100.0)),
        ])
    }

    #[test]
    fn test_resolve_anchor_first_match_wins() {
        let table = PerformanceTable::new(vec![
            record("1", None, Some(70.0)),
            record("1", None, Some(95.0)),
        ]);
        let anchor = resolve_anchor(&table, "1").unwrap();
        assert_eq!(anchor.final_kpi_score, Some(70.0));
    }

    #[test]
    fn test_resolve_anchor_not_found() {
        let table = scenario_table();
        assert_eq!(
            resolve_anchor(&table, "99").unwrap_err(),
            AnalysisError::NotFound {
                id: "99".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_subordinates_preserves_order() {
        let table = PerformanceTable::new(vec![
            record("5", Some("1"), Some(60.0)),
            record("1", None, Some(90.0)),
            record("4", Some("2"), Some(70.0)),
            record("3", Some("1"), None),
        ]);
        let ids: Vec<_> = resolve_subordinates(&table, "1")
            .iter()
            .map(|r| r.worker_id.as_str())
            .collect();
        assert_eq!(ids, vec!["5", "3"]);
        assert!(resolve_subordinates(&table, "5").is_empty());
    }

    #[test]
    fn test_resolve_peers() {
        let table = PerformanceTable::new(vec![
            record("1", None, Some(90.0)),
            record("2", Some("1"), Some(80.0)),
            record("3", Some("1"), Some(100.0)),
            record("4", Some("1"), Some(70.0)),
        ]);
        let ids: Vec<_> = resolve_peers(&table, "3")
            .unwrap()
            .iter()
            .map(|r| r.worker_id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "4"]);

        assert!(resolve_peers(&table, "1").unwrap().is_empty());
        assert!(resolve_peers(&table, "42").is_err());
    }

    #[test]
    fn test_supervisor_ids_sorted_and_unique() {
        let table = PerformanceTable::new(vec![
            record("1", None, None),
            record("2", Some("9"), None),
            record("3", Some("1"), None),
            record("4", Some("9"), None),
        ]);
        assert_eq!(supervisor_ids(&table), vec!["1", "9"]);
    }

    #[test]
    fn test_extract_scores_drops_missing() {
        let records = [
            record("1", None, Some(80.0)),
            record("2", None, None),
            record("3", None, Some(0.0)),
            record("4", None, Some(95.5)),
        ];
        let refs: Vec<&PerformanceRecord> = records.iter().collect();

        let scores = extract_scores(&refs, ScoreField::FinalKpiScore);
        assert_eq!(scores, vec![80.0, 0.0, 95.5]);
        assert_eq!(scores.len(), 3);
        assert_ne!(scores.len(), refs.len());

        // Idempotent: a second extraction yields the same sequence.
        assert_eq!(extract_scores(&refs, ScoreField::FinalKpiScore), scores);

        assert!(extract_scores(&refs, ScoreField::AssessmentScore).is_empty());
    }

    #[test]
    fn test_extract_labeled_scores_matches_order() {
        let records = [
            record("a", None, Some(1.0)),
            record("b", None, None),
            record("c", None, Some(3.0)),
        ];
        let refs: Vec<&PerformanceRecord> = records.iter().collect();
        let labeled = extract_labeled_scores(&refs, ScoreField::FinalKpiScore);
        let ids: Vec<_> = labeled.iter().map(|l| l.worker_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_empty_group_is_insufficient() {
        let err = compute_comparison(Some(90.0), &[], SkewnessEstimator::Adjusted).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::insufficient(InsufficientReason::EmptyGroup)
        );
    }

    #[test]
    fn test_missing_anchor_score_is_insufficient() {
        let err = compute_comparison(None, &[80.0], SkewnessEstimator::Adjusted).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::insufficient(InsufficientReason::MissingAnchorScore)
        );
    }

    #[test]
    fn test_zero_mean_gap_is_undefined() {
        let err =
            compute_comparison(Some(10.0), &[0.0, 0.0], SkewnessEstimator::Adjusted).unwrap_err();
        assert_eq!(err, AnalysisError::division(DivisionContext::GapPercent));

        let err =
            compute_comparison(Some(10.0), &[-5.0, 5.0], SkewnessEstimator::Biased).unwrap_err();
        assert_eq!(err, AnalysisError::division(DivisionContext::GapPercent));
    }

    #[test]
    fn test_subnormal_mean_gap_is_undefined() {
        let err = compute_comparison(
            Some(100.0),
            &[5e-324, 5e-324],
            SkewnessEstimator::Adjusted,
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::division(DivisionContext::GapPercent));
    }

    #[test]
    fn test_gap_is_zero_when_anchor_equals_mean() {
        let result =
            compute_comparison(Some(82.0), &[70.0, 75.0, 80.0, 85.0, 100.0], SkewnessEstimator::Adjusted)
                .unwrap();
        assert_eq!(result.gap_percent, 0.0);
    }

    #[test]
    fn test_gap_percent_sign() {
        let result =
            compute_comparison(Some(99.0), &[80.0, 100.0], SkewnessEstimator::Adjusted).unwrap();
        assert!((result.gap_percent - 10.0).abs() < 1e-9);

        let result =
            compute_comparison(Some(72.0), &[80.0, 100.0], SkewnessEstimator::Adjusted).unwrap();
        assert!((result.gap_percent - -20.0).abs() < 1e-9);
    }

    #[test]
    fn test_scenario_supervisor_with_two_subordinates() {
        let table = scenario_table();

        let adjusted =
            compare_with_subordinates(&table, "1", ScoreField::FinalKpiScore, SkewnessEstimator::Adjusted)
                .unwrap();
        assert_eq!(adjusted.result.subordinate_scores, vec![80.0, 100.0]);
        assert_eq!(adjusted.result.mean, 90.0);
        assert_eq!(adjusted.result.anchor_score, 90.0);
        assert_eq!(adjusted.result.gap_percent, 0.0);
        assert_eq!(adjusted.result.skewness, None);
        assert_eq!(adjusted.result.skew_category, None);

        let biased =
            compare_with_subordinates(&table, "1", ScoreField::FinalKpiScore, SkewnessEstimator::Biased)
                .unwrap();
        assert_eq!(biased.result.skewness, Some(0.0));
        assert_eq!(biased.result.skew_category, Some(SkewCategory::Symmetric));
    }

    #[test]
    fn test_scenario_unknown_id() {
        let table = scenario_table();
        let err =
            compare_with_subordinates(&table, "404", ScoreField::FinalKpiScore, SkewnessEstimator::Adjusted)
                .unwrap_err();
        assert!(matches!(err, AnalysisError::NotFound { .. }));
    }

    #[test]
    fn test_worker_without_subordinates_is_insufficient() {
        let table = scenario_table();
        let err =
            compare_with_subordinates(&table, "2", ScoreField::FinalKpiScore, SkewnessEstimator::Adjusted)
                .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::insufficient(InsufficientReason::EmptyGroup)
        );
    }

    #[test]
    fn test_zero_variance_group() {
        let result =
            compute_comparison(Some(90.0), &[95.0, 95.0, 95.0], SkewnessEstimator::Adjusted)
                .unwrap();
        assert_eq!(result.std_dev, Some(0.0));
        assert_eq!(result.skewness, None);
        assert_eq!(result.skew_category, None);
    }

    #[test]
    fn test_single_subordinate_std_undefined() {
        let result =
            compute_comparison(Some(90.0), &[80.0], SkewnessEstimator::Biased).unwrap();
        assert_eq!(result.std_dev, None);
        assert_eq!(result.skewness, None);
        assert_eq!(result.min, 80.0);
        assert_eq!(result.max, 80.0);
    }

    #[test]
    fn test_right_skew_classification() {
        let result = compute_comparison(
            Some(85.0),
            &[70.0, 75.0, 80.0, 85.0, 100.0],
            SkewnessEstimator::Adjusted,
        )
        .unwrap();
        assert_eq!(result.skew_category, Some(SkewCategory::RightSkewed));
    }

    #[test]
    fn test_compare_with_peers() {
        let table = PerformanceTable::new(vec![
            record("1", None, Some(90.0)),
            record("2", Some("1"), Some(80.0)),
            record("3", Some("1"), Some(100.0)),
            record("4", Some("1"), None),
        ]);
        let comparison =
            compare_with_peers(&table, "2", ScoreField::FinalKpiScore, SkewnessEstimator::Adjusted)
                .unwrap();
        assert_eq!(comparison.shape, ComparisonShape::Peers);
        let group_ids: Vec<&str> = comparison.group.iter().map(|r| r.worker_id.as_str()).collect();
        assert_eq!(group_ids, vec!["3", "4"]);
        assert_eq!(comparison.members.len(), 1);
        assert_eq!(comparison.members[0].worker_id, "3");
        assert!((comparison.result.gap_percent - -20.0).abs() < 1e-9);
    }

    #[test]
    fn test_comparison_is_deterministic() {
        let scores = [61.5, 77.25, 80.0, 93.75, 99.0];
        let first = compute_comparison(Some(88.0), &scores, SkewnessEstimator::Adjusted).unwrap();
        let second = compute_comparison(Some(88.0), &scores, SkewnessEstimator::Adjusted).unwrap();
        assert_eq!(first.mean.to_bits(), second.mean.to_bits());
        assert_eq!(first.gap_percent.to_bits(), second.gap_percent.to_bits());
        assert_eq!(
            first.skewness.map(f64::to_bits),
            second.skewness.map(f64::to_bits)
        );
        assert_eq!(first, second);
    }
}
