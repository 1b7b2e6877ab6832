//! Fama-French 3-factor regression.
//!
//! Model: `R_i - R_f = alpha + b_mkt * MKT + b_smb * SMB + b_hml * HML + e`,
//! estimated by ordinary least squares.

use std::collections::{BTreeSet, HashMap};

use analysis_core::{AnalysisError, AnalysisResult, Factor, FactorSeries, ReturnSeries};
use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::descriptive::DEGENERATE_STD;

/// Number of predictors (intercept excluded).
pub const FACTOR_COUNT: usize = 3;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Convert an annual risk-free rate to a daily one by compounding:
/// `(1 + r)^(1/252) - 1`.
pub fn daily_risk_free_rate(annual: f64) -> f64 {
    (1.0 + annual).powf(1.0 / TRADING_DAYS_PER_YEAR) - 1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub t_stat: f64,
    /// Two-sided, Student-t with `n - k - 1` degrees of freedom.
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorRegression {
    pub alpha: Coefficient,
    pub mkt: Coefficient,
    pub smb: Coefficient,
    pub hml: Coefficient,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub observations: usize,
}

impl FactorRegression {
    pub fn beta(&self, factor: Factor) -> &Coefficient {
        match factor {
            Factor::Market => &self.mkt,
            Factor::Size => &self.smb,
            Factor::Value => &self.hml,
        }
    }
}

/// Pair each excess return with its factor row. Every return date must exist
/// in the factor series; extra factor dates are ignored.
fn align_with_factors(
    series: &ReturnSeries,
    factors: &FactorSeries,
    rf_daily: f64,
) -> AnalysisResult<(Vec<f64>, Vec<[f64; FACTOR_COUNT]>)> {
    let mut excess = Vec::with_capacity(series.len());
    let mut rows = Vec::with_capacity(series.len());
    let mut missing: Vec<NaiveDate> = Vec::new();

    for (date, r) in series.iter() {
        match factors.on(date) {
            Some(obs) => {
                excess.push(r - rf_daily);
                rows.push(Factor::ALL.map(|f| obs.get(f)));
            }
            None => missing.push(date),
        }
    }

    if let Some(first) = missing.first() {
        return Err(AnalysisError::FactorAlignment(format!(
            "{} of {} return dates have no factor data (first missing: {})",
            missing.len(),
            series.len(),
            first
        )));
    }
    Ok((excess, rows))
}

fn coefficient(estimate: f64, variance: f64, t_dist: &StudentsT) -> Coefficient {
    let std_error = variance.max(0.0).sqrt();
    if std_error == 0.0 {
        // Exact fit: the estimate carries no sampling error.
        let (t_stat, p_value) = if estimate == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY.copysign(estimate), 0.0)
        };
        return Coefficient { estimate, std_error, t_stat, p_value };
    }
    let t_stat = estimate / std_error;
    let p_value = (2.0 * t_dist.sf(t_stat.abs())).min(1.0);
    Coefficient { estimate, std_error, t_stat, p_value }
}

/// OLS of `y` on an intercept plus the three factor columns.
pub fn ols(y: &[f64], rows: &[[f64; FACTOR_COUNT]]) -> AnalysisResult<FactorRegression> {
    let n = y.len();
    if n != rows.len() {
        return Err(AnalysisError::FactorAlignment(format!(
            "{} responses for {} factor rows",
            n,
            rows.len()
        )));
    }
    if n <= FACTOR_COUNT + 1 {
        return Err(AnalysisError::InsufficientData(format!(
            "regression on {} predictors needs more than {} observations, got {}",
            FACTOR_COUNT,
            FACTOR_COUNT + 1,
            n
        )));
    }

    let p = FACTOR_COUNT + 1;
    let x = DMatrix::from_fn(n, p, |i, j| if j == 0 { 1.0 } else { rows[i][j - 1] });
    let y_vec = DVector::from_column_slice(y);

    let xt = x.transpose();
    let xtx_inv = (&xt * &x).try_inverse().ok_or_else(|| {
        AnalysisError::DegenerateSeries(
            "factor design matrix is singular (collinear or constant factors)".to_string(),
        )
    })?;
    let beta = &xtx_inv * (&xt * &y_vec);

    let residuals = &y_vec - &x * &beta;
    let ssr = residuals.norm_squared();
    let y_mean = y_vec.mean();
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    if (sst / n as f64).sqrt() < DEGENERATE_STD {
        return Err(AnalysisError::DegenerateSeries(format!(
            "zero variance over {} observations",
            n
        )));
    }

    let df = (n - p) as f64;
    let sigma2 = ssr / df;
    let t_dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AnalysisError::InvalidData(format!("student-t: {}", e)))?;
    let coef = |j: usize| coefficient(beta[j], sigma2 * xtx_inv[(j, j)], &t_dist);

    let r_squared = 1.0 - ssr / sst;
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df;

    Ok(FactorRegression {
        alpha: coef(0),
        mkt: coef(1),
        smb: coef(2),
        hml: coef(3),
        r_squared,
        adj_r_squared,
        observations: n,
    })
}

/// Regress the series' excess returns on the factors sharing its dates.
pub fn regress_on_factors(
    series: &ReturnSeries,
    factors: &FactorSeries,
    rf_daily: f64,
) -> AnalysisResult<FactorRegression> {
    let (excess, rows) = align_with_factors(series, factors, rf_daily)?;
    ols(&excess, &rows)
}

/// Weighted blend `sum(w_i * r_i)` computed per date over the dates every
/// constituent has in common.
pub fn blend_portfolio(constituents: &[(f64, &ReturnSeries)]) -> AnalysisResult<ReturnSeries> {
    let Some((_, first)) = constituents.first() else {
        return Err(AnalysisError::InsufficientData(
            "portfolio has no constituents".to_string(),
        ));
    };

    let mut common: BTreeSet<NaiveDate> = first.dates().iter().copied().collect();
    for (_, series) in &constituents[1..] {
        let dates: BTreeSet<NaiveDate> = series.dates().iter().copied().collect();
        common = common.intersection(&dates).copied().collect();
    }
    if common.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "portfolio constituents share no return dates".to_string(),
        ));
    }

    let lookups: Vec<(f64, HashMap<NaiveDate, f64>)> = constituents
        .iter()
        .map(|(w, s)| (*w, s.iter().collect()))
        .collect();

    let dropped = constituents
        .iter()
        .map(|(_, s)| s.len() - common.len())
        .max()
        .unwrap_or(0);
    if dropped > 0 {
        tracing::debug!(
            "Portfolio blend uses {} common dates ({} dropped from the longest constituent)",
            common.len(),
            dropped
        );
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let returns: Vec<f64> = dates
        .iter()
        .map(|d| lookups.iter().map(|(w, m)| w * m[d]).sum::<f64>())
        .collect();

    ReturnSeries::new(dates, returns)
}
