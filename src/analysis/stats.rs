//! Descriptive statistics over score samples.
//!
//! Every function here is pure. Quantities that are undefined for the
//! given sample (too few values, zero spread) come back as `None` or as
//! an `AnalysisError`, never as a fabricated zero.

use crate::error::{AnalysisError, DivisionContext, InsufficientReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Estimator used for the skewness coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkewnessEstimator {
    /// Adjusted Fisher-Pearson coefficient `G1`, needs at least 3 values.
    #[default]
    Adjusted,
    /// Moment coefficient `g1 = m3 / m2^1.5`, needs at least 2 values.
    Biased,
}

impl SkewnessEstimator {
    /// Smallest sample size for which the estimator is defined.
    pub fn min_samples(&self) -> usize {
        match self {
            SkewnessEstimator::Adjusted => 3,
            SkewnessEstimator::Biased => 2,
        }
    }
}

impl fmt::Display for SkewnessEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkewnessEstimator::Adjusted => write!(f, "adjusted"),
            SkewnessEstimator::Biased => write!(f, "biased"),
        }
    }
}

impl FromStr for SkewnessEstimator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adjusted" => Ok(SkewnessEstimator::Adjusted),
            "biased" => Ok(SkewnessEstimator::Biased),
            other => Err(format!(
                "Unknown skewness estimator '{}'. Expected 'adjusted' or 'biased'",
                other
            )),
        }
    }
}

/// Arithmetic mean, `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1), `None` with fewer than 2 values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Smallest and largest value, `None` for an empty sample.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Skewness coefficient of the sample.
///
/// `None` when the sample is smaller than the estimator allows or has
/// no spread.
pub fn skewness(values: &[f64], estimator: SkewnessEstimator) -> Option<f64> {
    let n = values.len();
    if n < estimator.min_samples() {
        return None;
    }

    let mean = mean(values)?;
    let count = n as f64;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / count;

    // Rounding can leave a tiny m2 for identical values.
    if m2 <= (f64::EPSILON * mean).powi(2) {
        return None;
    }

    let g1 = m3 / m2.powf(1.5);
    match estimator {
        SkewnessEstimator::Biased => Some(g1),
        SkewnessEstimator::Adjusted => Some(g1 * (count * (count - 1.0)).sqrt() / (count - 2.0)),
    }
}

/// z-score normalization using the sample mean and standard deviation.
pub fn normalize_scores(values: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    let mean = mean(values)
        .ok_or_else(|| AnalysisError::insufficient(InsufficientReason::EmptyInput))?;
    let std_dev = nonzero_spread(values, mean)
        .ok_or_else(|| AnalysisError::division(DivisionContext::Normalization))?;

    Ok(values.iter().map(|v| (v - mean) / std_dev).collect())
}

/// Inverse of [`normalize_scores`] for a known mean and standard deviation.
#[allow(dead_code)] // Inverse of normalize_scores, covered by the round-trip test
pub fn denormalize_scores(z_scores: &[f64], mean: f64, std_dev: f64) -> Vec<f64> {
    z_scores.iter().map(|z| z * std_dev + mean).collect()
}

/// Sample standard deviation when it is usable as a divisor.
pub(crate) fn nonzero_spread(values: &[f64], mean: f64) -> Option<f64> {
    sample_std_dev(values).filter(|std| *std > f64::EPSILON * mean.abs() && *std > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn test_mean_and_std() {
        let values = [70.0, 75.0, 80.0, 85.0, 100.0];
        assert_eq!(mean(&values), Some(82.0));
        let std = sample_std_dev(&values).unwrap();
        assert!((std - 11.510864433221338).abs() < TOLERANCE);
    }

    #[test]
    fn test_std_undefined_for_single_value() {
        assert_eq!(sample_std_dev(&[42.0]), None);
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[3.0, -1.0, 7.5]), Some((-1.0, 7.5)));
        assert_eq!(min_max(&[]), None);
    }

    #[test]
    fn test_skewness_estimators() {
        let values = [1.0, 2.0, 3.0, 10.0];
        let biased = skewness(&values, SkewnessEstimator::Biased).unwrap();
        let adjusted = skewness(&values, SkewnessEstimator::Adjusted).unwrap();
        assert!((biased - 1.0182337649086284).abs() < TOLERANCE);
        assert!((adjusted - 1.763632614803888).abs() < TOLERANCE);
    }

    #[test]
    fn test_left_skewed_sample() {
        let values = [60.0, 85.0, 88.0, 90.0, 92.0];
        let adjusted = skewness(&values, SkewnessEstimator::Adjusted).unwrap();
        assert!((adjusted - -2.024817499983058).abs() < TOLERANCE);
    }

    #[test]
    fn test_skewness_two_values() {
        let values = [80.0, 100.0];
        assert_eq!(skewness(&values, SkewnessEstimator::Adjusted), None);
        assert_eq!(skewness(&values, SkewnessEstimator::Biased), Some(0.0));
    }

    #[test]
    fn test_skewness_zero_variance_is_undefined() {
        let values = [95.0, 95.0, 95.0];
        assert_eq!(skewness(&values, SkewnessEstimator::Adjusted), None);
        assert_eq!(skewness(&values, SkewnessEstimator::Biased), None);

        let tiny = [0.1, 0.1, 0.1];
        assert_eq!(skewness(&tiny, SkewnessEstimator::Biased), None);
    }

    #[test]
    fn test_normalize_round_trip() {
        let values = [55.5, 70.0, 81.25, 90.0, 99.9];
        let z = normalize_scores(&values).unwrap();

        let mean = mean(&values).unwrap();
        let std = sample_std_dev(&values).unwrap();
        let restored = denormalize_scores(&z, mean, std);

        for (original, back) in values.iter().zip(restored.iter()) {
            assert!((original - back).abs() < TOLERANCE);
        }
        assert!(z.iter().sum::<f64>().abs() < TOLERANCE);
    }

    #[test]
    fn test_normalize_zero_variance_is_flagged() {
        let err = normalize_scores(&[95.0, 95.0, 95.0]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::division(DivisionContext::Normalization)
        );
    }

    #[test]
    fn test_normalize_degenerate_inputs() {
        assert_eq!(
            normalize_scores(&[]).unwrap_err(),
            AnalysisError::insufficient(InsufficientReason::EmptyInput)
        );
        assert_eq!(
            normalize_scores(&[12.0]).unwrap_err(),
            AnalysisError::division(DivisionContext::Normalization)
        );
    }

    #[test]
    fn test_estimator_from_str() {
        assert_eq!("Biased".parse::<SkewnessEstimator>(), Ok(SkewnessEstimator::Biased));
        assert_eq!("adjusted".parse::<SkewnessEstimator>(), Ok(SkewnessEstimator::Adjusted));
        assert!("pearson".parse::<SkewnessEstimator>().is_err());
    }
}
