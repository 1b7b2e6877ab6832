//! Jarque-Bera normality test.

use analysis_core::{AnalysisError, AnalysisResult};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::descriptive::DescriptiveStats;

/// Significance level for the normal / non-normal classification.
pub const NORMALITY_SIGNIFICANCE: f64 = 0.05;

/// p-values below this are displayed in scientific notation.
const SCIENTIFIC_CUTOFF: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityTest {
    pub statistic: f64,
    pub p_value: f64,
    pub p_value_str: String,
    pub is_normal: bool,
}

/// `JB = n/6 * (S^2 + K^2/4)` with S the skewness and K the excess kurtosis,
/// tested against a chi-squared distribution with 2 degrees of freedom.
pub fn jarque_bera(n: usize, stats: &DescriptiveStats) -> AnalysisResult<NormalityTest> {
    if n == 0 {
        return Err(AnalysisError::InsufficientData(
            "Jarque-Bera needs at least one observation".to_string(),
        ));
    }
    let s = stats.skewness;
    let k = stats.kurtosis;
    let statistic = n as f64 / 6.0 * (s * s + k * k / 4.0);

    let chi2 = ChiSquared::new(2.0)
        .map_err(|e| AnalysisError::InvalidData(format!("chi-squared: {}", e)))?;
    let p_value = chi2.sf(statistic);

    Ok(NormalityTest {
        statistic,
        p_value,
        p_value_str: format_p_value(p_value),
        is_normal: p_value >= NORMALITY_SIGNIFICANCE,
    })
}

/// Display string for a p-value: four decimals, or two-decimal scientific
/// notation (`1.23e-05`) below 0.001.
pub fn format_p_value(p: f64) -> String {
    if p < SCIENTIFIC_CUTOFF {
        format_scientific(p)
    } else {
        format!("{:.4}", p)
    }
}

fn format_scientific(value: f64) -> String {
    let raw = format!("{:.2e}", value);
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}
