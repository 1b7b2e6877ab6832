use analysis_core::{AnalysisError, AnalysisResult};
use serde::{Serialize, Serializer};

pub const DEFAULT_ACF_LAGS: usize = 30;

/// z-value of the two-sided 95% band for the white-noise null.
const CONFIDENCE_Z: f64 = 1.96;

/// Sample autocorrelations at lags `0..=L`.
#[derive(Debug, Clone, PartialEq)]
pub struct AcfSeries {
    coefficients: Vec<f64>,
    sample_size: usize,
}

impl AcfSeries {
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn max_lag(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Half-width of the "no autocorrelation" band, `1.96 / sqrt(n)`.
    pub fn confidence_bound(&self) -> f64 {
        CONFIDENCE_Z / (self.sample_size as f64).sqrt()
    }

    /// Lags (>= 1) whose coefficient falls outside the confidence band.
    pub fn significant_lags(&self) -> Vec<usize> {
        let bound = self.confidence_bound();
        self.coefficients
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, r)| r.abs() > bound)
            .map(|(lag, _)| lag)
            .collect()
    }
}

// The dashboard receives the bare coefficient array.
impl Serialize for AcfSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.coefficients.serialize(serializer)
    }
}

/// Biased autocorrelation estimator (every lag divides by the full-sample
/// sum of squares). Lags are capped at `n - 1`.
pub fn autocorrelation(values: &[f64], max_lag: usize) -> AnalysisResult<AcfSeries> {
    let n = values.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "autocorrelation needs at least 2 observations, got {}",
            n
        )));
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let deviations: Vec<f64> = values.iter().map(|x| x - mean).collect();
    let denom: f64 = deviations.iter().map(|d| d * d).sum();
    if denom == 0.0 {
        return Err(AnalysisError::DegenerateSeries(
            "autocorrelation undefined for zero variance".to_string(),
        ));
    }

    let lags = max_lag.min(n - 1);
    let mut coefficients = Vec::with_capacity(lags + 1);
    coefficients.push(1.0);
    for lag in 1..=lags {
        let cov: f64 = deviations[lag..]
            .iter()
            .zip(deviations.iter())
            .map(|(a, b)| a * b)
            .sum();
        coefficients.push(cov / denom);
    }

    Ok(AcfSeries {
        coefficients,
        sample_size: n,
    })
}
