use analysis_core::{AnalysisError, AnalysisResult};
use serde::Serialize;

use crate::descriptive::{DescriptiveStats, DEGENERATE_STD};

/// Tail probability for historical VaR.
pub const VAR_TAIL: f64 = 0.05;

/// Sharpe ratios are reported per period (daily data, not annualized) with a
/// zero risk-free rate.
pub const SHARPE_ANNUALIZATION_FACTOR: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskMetrics {
    /// 5th percentile of returns; negative when it represents a loss.
    pub var_95: f64,
    pub sharpe_ratio: f64,
}

/// Percentile of already-sorted data with linear interpolation between
/// order statistics at rank `q * (n - 1)`.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> AnalysisResult<f64> {
    if sorted.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "percentile of empty sample".to_string(),
        ));
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Historical (non-parametric) Value at Risk at 95% confidence.
pub fn historical_var(returns: &[f64]) -> AnalysisResult<f64> {
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    percentile_sorted(&sorted, VAR_TAIL)
}

/// Mean return over standard deviation.
pub fn sharpe_ratio(mean: f64, std: f64) -> AnalysisResult<f64> {
    if std < DEGENERATE_STD {
        return Err(AnalysisError::DegenerateSeries(
            "Sharpe ratio undefined for zero volatility".to_string(),
        ));
    }
    Ok(mean / std * SHARPE_ANNUALIZATION_FACTOR)
}

pub fn risk_metrics(returns: &[f64], stats: &DescriptiveStats) -> AnalysisResult<RiskMetrics> {
    Ok(RiskMetrics {
        var_95: historical_var(returns)?,
        sharpe_ratio: sharpe_ratio(stats.mean, stats.std)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates_linearly() {
        let sorted: Vec<f64> = (1..=11).map(|i| i as f64).collect();
        // rank = 0.05 * 10 = 0.5 -> halfway between 1 and 2
        assert!((percentile_sorted(&sorted, 0.05).unwrap() - 1.5).abs() < 1e-12);
        assert_eq!(percentile_sorted(&sorted, 0.0).unwrap(), 1.0);
        assert_eq!(percentile_sorted(&sorted, 1.0).unwrap(), 11.0);
        assert_eq!(percentile_sorted(&sorted, 0.5).unwrap(), 6.0);
    }

    #[test]
    fn test_var_is_a_loss_for_mixed_returns() {
        let returns = [0.02, -0.03, 0.01, -0.05, 0.04, 0.0, -0.01, 0.03, 0.015, -0.02];
        let var = historical_var(&returns).unwrap();
        // sorted: -0.05, -0.03, ... rank 0.45 -> -0.05 + 0.45 * 0.02
        assert!((var - (-0.041)).abs() < 1e-12);
        assert!(var < 0.0);
    }

    #[test]
    fn test_var_single_observation() {
        assert_eq!(historical_var(&[-0.02]).unwrap(), -0.02);
    }

    #[test]
    fn test_sharpe_is_mean_over_std() {
        assert!((sharpe_ratio(0.001, 0.02).unwrap() - 0.05).abs() < 1e-12);
        assert!(matches!(
            sharpe_ratio(0.001, 0.0),
            Err(AnalysisError::DegenerateSeries(_))
        ));
    }
}
