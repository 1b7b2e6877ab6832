pub mod autocorrelation;
pub mod config;
pub mod descriptive;
pub mod distribution;
pub mod interpretation;
pub mod normality;
pub mod regression;
pub mod report;
pub mod returns;
pub mod risk;

#[cfg(test)]
mod engine_tests;

use std::collections::{BTreeMap, HashMap};

use analysis_core::{
    AnalysisError, AnalysisResult, FactorSeries, PortfolioSpec, PricePoint, ReturnSeries,
};
use rayon::prelude::*;

pub use config::AnalysisConfig;
pub use regression::FactorRegression;
pub use report::{
    BatchPayload, FactorExposure, Outcome, PortfolioExposure, PriceHistory, Statistics,
    TickerAnalysis,
};

use crate::autocorrelation::autocorrelation;
use crate::descriptive::describe;
use crate::distribution::{histogram, qq_plot};
use crate::normality::jarque_bera;
use crate::regression::{blend_portfolio, daily_risk_free_rate, regress_on_factors};
use crate::returns::calculate_returns;
use crate::risk::risk_metrics;

/// Stateless analytics façade. Holds only its configuration, so one instance
/// can be shared across threads and requests.
pub struct QuantAnalysisEngine {
    config: AnalysisConfig,
}

impl QuantAnalysisEngine {
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn ensure_observations(&self, series: &ReturnSeries) -> AnalysisResult<()> {
        if series.len() < self.config.min_observations {
            return Err(AnalysisError::InsufficientData(format!(
                "need at least {} returns, got {}",
                self.config.min_observations,
                series.len()
            )));
        }
        Ok(())
    }

    /// Full statistics bundle for one return series.
    pub fn analyze_returns(&self, series: &ReturnSeries) -> AnalysisResult<Statistics> {
        self.ensure_observations(series)?;
        let values = series.values();
        let stats = describe(values)?;
        let normality = jarque_bera(values.len(), &stats)?;
        let risk = risk_metrics(values, &stats)?;
        Ok(Statistics::new(&stats, normality, risk))
    }

    /// Everything the dashboard shows for one ticker's price history.
    pub fn analyze_ticker(&self, prices: &[PricePoint]) -> AnalysisResult<TickerAnalysis> {
        let series = calculate_returns(prices)?;
        let statistics = self.analyze_returns(&series)?;
        let values = series.values();

        Ok(TickerAnalysis {
            price_history: PriceHistory::from_points(prices),
            statistics,
            histogram: histogram(values, self.config.histogram_bins)?,
            qq_plot: qq_plot(values)?,
            acf: autocorrelation(values, self.config.acf_lags)?,
        })
    }

    /// Analyze many tickers in parallel. A failing ticker fills its own slot
    /// with an error and leaves the others untouched.
    pub fn analyze_batch(
        &self,
        histories: &[(String, Vec<PricePoint>)],
    ) -> BTreeMap<String, Outcome<TickerAnalysis>> {
        histories
            .par_iter()
            .map(|(ticker, prices)| {
                let result = self.analyze_ticker(prices);
                if let Err(e) = &result {
                    tracing::warn!("Analysis failed for {}: {}", ticker, e);
                }
                (ticker.clone(), Outcome::from(result))
            })
            .collect()
    }

    pub fn factor_regression(
        &self,
        prices: &[PricePoint],
        factors: &FactorSeries,
    ) -> AnalysisResult<FactorRegression> {
        let series = calculate_returns(prices)?;
        self.ensure_observations(&series)?;
        regress_on_factors(
            &series,
            factors,
            daily_risk_free_rate(self.config.risk_free_rate_annual),
        )
    }

    /// Fama-French 3-factor exposure of a single asset.
    pub fn factor_exposure(
        &self,
        prices: &[PricePoint],
        factors: &FactorSeries,
    ) -> AnalysisResult<FactorExposure> {
        let reg = self.factor_regression(prices, factors)?;
        Ok(FactorExposure::from(&reg))
    }

    pub fn factor_exposure_batch(
        &self,
        histories: &[(String, Vec<PricePoint>)],
        factors: &FactorSeries,
    ) -> BTreeMap<String, Outcome<FactorExposure>> {
        histories
            .par_iter()
            .map(|(ticker, prices)| {
                let result = self.factor_exposure(prices, factors);
                if let Err(e) = &result {
                    tracing::warn!("Factor regression failed for {}: {}", ticker, e);
                }
                (ticker.clone(), Outcome::from(result))
            })
            .collect()
    }

    /// Weighted portfolio return series built from each constituent's price
    /// history, restricted to the dates all constituents share.
    pub fn portfolio_returns(
        &self,
        spec: &PortfolioSpec,
        histories: &HashMap<String, Vec<PricePoint>>,
    ) -> AnalysisResult<ReturnSeries> {
        let mut constituents = Vec::with_capacity(spec.holdings().len());
        for (ticker, weight) in spec.holdings() {
            let prices = histories
                .get(ticker)
                .ok_or_else(|| AnalysisError::UnknownTicker(ticker.clone()))?;
            constituents.push((*weight, calculate_returns(prices)?));
        }

        let borrowed: Vec<(f64, &ReturnSeries)> =
            constituents.iter().map(|(w, s)| (*w, s)).collect();
        let blended = blend_portfolio(&borrowed)?;
        self.ensure_observations(&blended)?;
        Ok(blended)
    }

    /// Factor exposure of the weighted portfolio, computed with the same
    /// regression and interpretation as a single asset.
    pub fn portfolio_exposure(
        &self,
        spec: &PortfolioSpec,
        histories: &HashMap<String, Vec<PricePoint>>,
        factors: &FactorSeries,
    ) -> AnalysisResult<PortfolioExposure> {
        let blended = self.portfolio_returns(spec, histories)?;
        let reg = regress_on_factors(
            &blended,
            factors,
            daily_risk_free_rate(self.config.risk_free_rate_annual),
        )?;
        tracing::info!(
            "Portfolio regression over {} tickers, {} observations, R²={:.3}",
            spec.holdings().len(),
            reg.observations,
            reg.r_squared
        );

        Ok(PortfolioExposure {
            exposure: FactorExposure::from(&reg),
            portfolio: spec.tickers(),
            weights: spec.weights(),
        })
    }
}

impl Default for QuantAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}
