use analysis_core::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

use crate::autocorrelation::DEFAULT_ACF_LAGS;
use crate::distribution::DEFAULT_HISTOGRAM_BINS;

/// Tunables for [`crate::QuantAnalysisEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub histogram_bins: usize,
    pub acf_lags: usize,
    /// Annual rate, compounded down to a daily rate for the regression.
    pub risk_free_rate_annual: f64,
    /// Fewest returns a statistics bundle is computed from.
    pub min_observations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            acf_lags: DEFAULT_ACF_LAGS,
            risk_free_rate_annual: 0.05,
            min_observations: 3,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.histogram_bins == 0 {
            return Err(AnalysisError::InvalidData(
                "histogram_bins must be at least 1".to_string(),
            ));
        }
        if self.min_observations < 2 {
            return Err(AnalysisError::InvalidData(
                "min_observations must be at least 2".to_string(),
            ));
        }
        if !self.risk_free_rate_annual.is_finite() || self.risk_free_rate_annual <= -1.0 {
            return Err(AnalysisError::InvalidData(format!(
                "risk-free rate {} is out of range",
                self.risk_free_rate_annual
            )));
        }
        Ok(())
    }
}
