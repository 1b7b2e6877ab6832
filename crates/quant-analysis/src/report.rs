//! JSON payloads consumed by the dashboard.
//!
//! Field names here are a wire contract. The numeric types elsewhere in the
//! crate stay free to evolve; these structs pin the shape.

use std::collections::BTreeMap;

use analysis_core::{AnalysisResult, PricePoint};
use chrono::Utc;
use serde::Serialize;

use crate::autocorrelation::AcfSeries;
use crate::descriptive::DescriptiveStats;
use crate::distribution::{HistogramBins, QQPlotData};
use crate::interpretation::{
    interpret_kurtosis, interpret_regression, interpret_skewness, RegressionInterpretation,
};
use crate::normality::NormalityTest;
use crate::regression::FactorRegression;
use crate::risk::RiskMetrics;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    pub dates: Vec<String>,
    pub prices: Vec<f64>,
}

impl PriceHistory {
    pub fn from_points(points: &[PricePoint]) -> Self {
        let (dates, prices) = points
            .iter()
            .map(|p| (p.date.format(DATE_FORMAT).to_string(), p.close))
            .unzip();
        Self { dates, prices }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub normalcy_test: NormalityTest,
    pub skewness_interpretation: String,
    pub kurtosis_interpretation: String,
    pub risk: RiskMetrics,
}

impl Statistics {
    pub fn new(stats: &DescriptiveStats, normalcy_test: NormalityTest, risk: RiskMetrics) -> Self {
        Self {
            mean: stats.mean,
            std: stats.std,
            min: stats.min,
            max: stats.max,
            skewness: stats.skewness,
            kurtosis: stats.kurtosis,
            normalcy_test,
            skewness_interpretation: interpret_skewness(stats.skewness),
            kurtosis_interpretation: interpret_kurtosis(stats.kurtosis),
            risk,
        }
    }
}

/// Everything the dashboard renders for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerAnalysis {
    pub price_history: PriceHistory,
    pub statistics: Statistics,
    pub histogram: HistogramBins,
    pub qq_plot: QQPlotData,
    pub acf: AcfSeries,
}

/// Slot in a batch response: the payload, or `{"error": "..."}` when that
/// one ticker failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Ok(T),
    Failed { error: String },
}

impl<T> Outcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }
}

impl<T> From<AnalysisResult<T>> for Outcome<T> {
    fn from(result: AnalysisResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(e) => Outcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// `{timestamp, tickers}` wrapper for multi-ticker responses.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPayload<T> {
    pub timestamp: String,
    pub tickers: BTreeMap<String, Outcome<T>>,
}

impl<T> BatchPayload<T> {
    pub fn new(tickers: BTreeMap<String, Outcome<T>>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            tickers,
        }
    }
}

/// Per-coefficient values keyed `alpha`, `MKT`, `SMB`, `HML`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoefficientTable {
    pub alpha: f64,
    #[serde(rename = "MKT")]
    pub mkt: f64,
    #[serde(rename = "SMB")]
    pub smb: f64,
    #[serde(rename = "HML")]
    pub hml: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorExposure {
    pub betas: CoefficientTable,
    pub p_values: CoefficientTable,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub interpretation: RegressionInterpretation,
}

impl From<&FactorRegression> for FactorExposure {
    fn from(reg: &FactorRegression) -> Self {
        Self {
            betas: CoefficientTable {
                alpha: reg.alpha.estimate,
                mkt: reg.mkt.estimate,
                smb: reg.smb.estimate,
                hml: reg.hml.estimate,
            },
            p_values: CoefficientTable {
                alpha: reg.alpha.p_value,
                mkt: reg.mkt.p_value,
                smb: reg.smb.p_value,
                hml: reg.hml.p_value,
            },
            r_squared: reg.r_squared,
            adj_r_squared: reg.adj_r_squared,
            interpretation: interpret_regression(reg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioExposure {
    #[serde(flatten)]
    pub exposure: FactorExposure,
    pub portfolio: Vec<String>,
    pub weights: Vec<f64>,
}
