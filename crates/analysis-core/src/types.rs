use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{AnalysisError, AnalysisResult};

/// Portfolio weights must sum to 1.0 within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Ordered periodic returns paired with the date each return is realised on.
///
/// Fields are private so a series cannot change after it is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    returns: Vec<f64>,
}

impl ReturnSeries {
    /// Build a series from parallel vectors. Dates must be strictly ascending
    /// and every return finite.
    pub fn new(dates: Vec<NaiveDate>, returns: Vec<f64>) -> AnalysisResult<Self> {
        if dates.len() != returns.len() {
            return Err(AnalysisError::InvalidData(format!(
                "{} dates for {} returns",
                dates.len(),
                returns.len()
            )));
        }
        if returns.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "return series is empty".to_string(),
            ));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(AnalysisError::InvalidData(format!(
                "dates not strictly ascending at {}",
                w[1]
            )));
        }
        if let Some(i) = returns.iter().position(|r| !r.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "non-finite return on {}",
                dates[i]
            )));
        }
        Ok(Self { dates, returns })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.returns
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.returns.iter().copied())
    }
}

/// The three Fama-French regressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    #[serde(rename = "MKT")]
    Market,
    #[serde(rename = "SMB")]
    Size,
    #[serde(rename = "HML")]
    Value,
}

impl Factor {
    pub const ALL: [Factor; 3] = [Factor::Market, Factor::Size, Factor::Value];
}

/// One row of factor returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    pub date: NaiveDate,
    /// Market excess return (R_m - R_f).
    pub mkt: f64,
    pub smb: f64,
    pub hml: f64,
}

impl FactorObservation {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Market => self.mkt,
            Factor::Size => self.smb,
            Factor::Value => self.hml,
        }
    }
}

/// Daily factor returns indexed by date, strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSeries {
    rows: Vec<FactorObservation>,
}

impl FactorSeries {
    pub fn new(rows: Vec<FactorObservation>) -> AnalysisResult<Self> {
        if let Some(w) = rows.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(AnalysisError::InvalidData(format!(
                "factor dates not strictly ascending at {}",
                w[1].date
            )));
        }
        if let Some(row) = rows
            .iter()
            .find(|r| !(r.mkt.is_finite() && r.smb.is_finite() && r.hml.is_finite()))
        {
            return Err(AnalysisError::InvalidData(format!(
                "non-finite factor value on {}",
                row.date
            )));
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[FactorObservation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Binary search on the sorted dates.
    pub fn on(&self, date: NaiveDate) -> Option<&FactorObservation> {
        self.rows
            .binary_search_by(|row| row.date.cmp(&date))
            .ok()
            .map(|i| &self.rows[i])
    }
}

/// Ordered (ticker, weight) pairs describing a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSpec {
    holdings: Vec<(String, f64)>,
}

impl PortfolioSpec {
    /// Validate and build a portfolio. Weights are never renormalized.
    pub fn new(tickers: Vec<String>, weights: Vec<f64>) -> AnalysisResult<Self> {
        if tickers.is_empty() {
            return Err(AnalysisError::InvalidWeights(
                "portfolio has no constituents".to_string(),
            ));
        }
        if tickers.len() != weights.len() {
            return Err(AnalysisError::InvalidWeights(format!(
                "{} tickers but {} weights",
                tickers.len(),
                weights.len()
            )));
        }
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(AnalysisError::InvalidWeights(
                "weights must be finite".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = tickers.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(AnalysisError::InvalidWeights(format!(
                "ticker {} listed more than once",
                dup
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AnalysisError::InvalidWeights(format!(
                "weights sum to {:.6}, expected 1.0",
                total
            )));
        }
        Ok(Self {
            holdings: tickers.into_iter().zip(weights).collect(),
        })
    }

    /// Equal weights over the given tickers.
    pub fn equal_weighted(tickers: Vec<String>) -> AnalysisResult<Self> {
        let n = tickers.len();
        if n == 0 {
            return Err(AnalysisError::InvalidWeights(
                "portfolio has no constituents".to_string(),
            ));
        }
        let weights = vec![1.0 / n as f64; n];
        Self::new(tickers, weights)
    }

    pub fn holdings(&self) -> &[(String, f64)] {
        &self.holdings
    }

    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|(t, _)| t.clone()).collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.holdings.iter().map(|(_, w)| *w).collect()
    }
}
