//! Chart series: histogram bins and density curves.
//!
//! Curves are sampled evenly over `[min - padding, max + padding]`.

use crate::analysis::stats;
use crate::error::{AnalysisError, DivisionContext, InsufficientReason};
use crate::models::{DensityCurve, HistogramBin};
use std::f64::consts::PI;

/// Default padding added on both sides of the score range.
pub const DEFAULT_PADDING: f64 = 5.0;

/// Sampling range of a density curve.
pub fn density_range(scores: &[f64], padding: f64) -> Option<(f64, f64)> {
    let (min, max) = stats::min_max(scores)?;
    Some((min - padding, max + padding))
}

/// `points` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points).map(|i| start + step * i as f64).collect()
        }
    }
}

fn normal_pdf(x: f64, mean: f64, std_dev: f64) -> f64 {
    let z = (x - mean) / std_dev;
    (-0.5 * z * z).exp() / (std_dev * (2.0 * PI).sqrt())
}

/// Sample mean and a usable spread, or the reason there is none.
fn location_and_spread(scores: &[f64]) -> Result<(f64, f64), AnalysisError> {
    let mean = stats::mean(scores)
        .ok_or_else(|| AnalysisError::insufficient(InsufficientReason::EmptyInput))?;
    let std_dev = stats::nonzero_spread(scores, mean)
        .ok_or_else(|| AnalysisError::division(DivisionContext::DensityCurve))?;
    Ok((mean, std_dev))
}

/// Normal density fitted with the sample mean and standard deviation.
pub fn normal_density_curve(
    scores: &[f64],
    points: usize,
    padding: f64,
) -> Result<DensityCurve, AnalysisError> {
    let (mean, std_dev) = location_and_spread(scores)?;
    let (start, end) = density_range(scores, padding)
        .ok_or_else(|| AnalysisError::insufficient(InsufficientReason::EmptyInput))?;

    let x = linspace(start, end, points);
    let y = x.iter().map(|&v| normal_pdf(v, mean, std_dev)).collect();
    Ok(DensityCurve { x, y })
}

/// Gaussian kernel density estimate with Scott's bandwidth.
pub fn kde_curve(
    scores: &[f64],
    points: usize,
    padding: f64,
) -> Result<DensityCurve, AnalysisError> {
    let (_, std_dev) = location_and_spread(scores)?;
    let (start, end) = density_range(scores, padding)
        .ok_or_else(|| AnalysisError::insufficient(InsufficientReason::EmptyInput))?;

    let n = scores.len() as f64;
    let bandwidth = std_dev * n.powf(-0.2);

    let x = linspace(start, end, points);
    let y = x
        .iter()
        .map(|&v| scores.iter().map(|&s| normal_pdf(v, s, bandwidth)).sum::<f64>() / n)
        .collect();
    Ok(DensityCurve { x, y })
}

/// Equal-width histogram over `[min, max]`; the last bin is closed.
///
/// When every score is equal a single bin holds all of them.
pub fn histogram(scores: &[f64], bins: usize) -> Vec<HistogramBin> {
    let Some((min, max)) = stats::min_max(scores) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: scores.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &score in scores {
        let index = (((score - min) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i == bins - 1 {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}
