//! Descriptive statistics.
//!
//! All moments use population (biased) estimators: the variance divides by
//! n, skewness is the Fisher-Pearson coefficient `m3 / m2^1.5`, and kurtosis
//! is reported as excess kurtosis `m4 / m2^2 - 3`. The Jarque-Bera test in
//! [`crate::normality`] is calibrated on these same estimators.

use analysis_core::{AnalysisError, AnalysisResult};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Standard deviations below this are treated as zero.
pub const DEGENERATE_STD: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LocationScale {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal distribution -> 0).
    pub kurtosis: f64,
}

/// Mean, population standard deviation, min and max. Defined for any
/// non-empty slice, including constant ones.
pub fn location_and_scale(values: &[f64]) -> AnalysisResult<LocationScale> {
    if values.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "no observations".to_string(),
        ));
    }
    Ok(LocationScale {
        mean: values.mean(),
        std: values.population_std_dev(),
        min: Statistics::min(values),
        max: Statistics::max(values),
    })
}

/// Central moments m2, m3, m4 around the mean.
fn central_moments(values: &[f64], mean: f64) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let (s2, s3, s4) = values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), &x| {
        let d = x - mean;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    });
    (s2 / n, s3 / n, s4 / n)
}

/// Full descriptive bundle. Fails with `DegenerateSeries` when the standard
/// deviation is zero, since skewness and kurtosis are then undefined.
pub fn describe(values: &[f64]) -> AnalysisResult<DescriptiveStats> {
    let base = location_and_scale(values)?;
    if base.std < DEGENERATE_STD {
        return Err(AnalysisError::DegenerateSeries(format!(
            "zero variance over {} observations",
            values.len()
        )));
    }

    let (m2, m3, m4) = central_moments(values, base.mean);
    Ok(DescriptiveStats {
        mean: base.mean,
        std: base.std,
        min: base.min,
        max: base.max,
        skewness: m3 / m2.powf(1.5),
        kurtosis: m4 / (m2 * m2) - 3.0,
    })
}
