//! Return series builder.
//!
//! Returns are simple (arithmetic) period-over-period changes,
//! `p[t] / p[t-1] - 1`, dated on the later observation. Every downstream
//! constant (daily Sharpe, daily risk-free conversion) assumes this convention.

use analysis_core::{AnalysisError, AnalysisResult, PricePoint, ReturnSeries};

/// Build a simple-return series from prices sorted by ascending date.
pub fn calculate_returns(prices: &[PricePoint]) -> AnalysisResult<ReturnSeries> {
    if prices.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "need at least 2 prices to compute returns, got {}",
            prices.len()
        )));
    }
    if let Some(bad) = prices.iter().find(|p| !p.close.is_finite() || p.close <= 0.0) {
        return Err(AnalysisError::InvalidData(format!(
            "non-positive price {} on {}",
            bad.close, bad.date
        )));
    }

    let (dates, returns): (Vec<_>, Vec<_>) = prices
        .windows(2)
        .map(|w| (w[1].date, w[1].close / w[0].close - 1.0))
        .unzip();

    ReturnSeries::new(dates, returns)
}
