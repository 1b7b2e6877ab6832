use std::collections::HashMap;

use analysis_core::{AnalysisError, AnalysisResult, PortfolioSpec};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use price_store::normalize_ticker;
use quant_analysis::{BatchPayload, FactorExposure, PortfolioExposure};
use serde::Deserialize;

use crate::{fetch_histories, partition_fetched, run_blocking, AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioQuery {
    /// Comma-separated symbols.
    pub tickers: Option<String>,
    /// Comma-separated weights, same order as `tickers`.
    pub weights: Option<String>,
}

pub fn factor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/factor-analysis", get(get_all_factor_exposures))
        .route("/api/factor-analysis/:ticker", get(get_factor_exposure))
        .route("/api/portfolio-analysis", get(get_portfolio_exposure))
}

async fn get_factor_exposure(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<FactorExposure>, AppError> {
    let ticker = normalize_ticker(&ticker)?;
    let (prices, factors) = tokio::try_join!(
        state.source.price_history(&ticker),
        state.source.factor_returns()
    )?;

    let engine = state.engine.clone();
    let exposure =
        run_blocking("factor regression", move || engine.factor_exposure(&prices, &factors))
            .await??;
    tracing::info!(
        "{} factor exposure: MKT={:.3}, R²={:.3}",
        ticker,
        exposure.betas.mkt,
        exposure.r_squared
    );
    Ok(Json(exposure))
}

async fn get_all_factor_exposures(
    State(state): State<AppState>,
) -> Result<Json<BatchPayload<FactorExposure>>, AppError> {
    let (tickers, factors) =
        tokio::try_join!(state.source.list_tickers(), state.source.factor_returns())?;

    let fetched = fetch_histories(state.source.as_ref(), &tickers).await;
    let (loaded, failed) = partition_fetched(fetched);

    let engine = state.engine.clone();
    let mut results = run_blocking("factor regression", move || {
        engine.factor_exposure_batch(&loaded, &factors)
    })
    .await?;
    results.extend(failed);

    Ok(Json(BatchPayload::new(results)))
}

fn split_param(raw: &str) -> Vec<&str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

/// Resolve the requested portfolio, falling back to the configured default
/// for whatever the query leaves out.
fn resolve_portfolio(query: &PortfolioQuery, default: &PortfolioSpec) -> AnalysisResult<PortfolioSpec> {
    let weights = match &query.weights {
        Some(raw) => Some(
            split_param(raw)
                .into_iter()
                .map(|w| {
                    w.parse::<f64>().map_err(|_| {
                        AnalysisError::InvalidWeights(format!("'{}' is not a number", w))
                    })
                })
                .collect::<AnalysisResult<Vec<f64>>>()?,
        ),
        None => None,
    };

    let tickers = match &query.tickers {
        Some(raw) => split_param(raw)
            .into_iter()
            .map(normalize_ticker)
            .collect::<AnalysisResult<Vec<String>>>()?,
        None if weights.is_none() => return Ok(default.clone()),
        None => default.tickers(),
    };

    match weights {
        Some(weights) => PortfolioSpec::new(tickers, weights),
        None => PortfolioSpec::equal_weighted(tickers),
    }
}

async fn get_portfolio_exposure(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Result<Json<PortfolioExposure>, AppError> {
    let spec = resolve_portfolio(&query, &state.default_portfolio)?;
    let tickers = spec.tickers();

    let (fetched, factors) = tokio::join!(
        fetch_histories(state.source.as_ref(), &tickers),
        state.source.factor_returns()
    );
    let factors = factors?;
    let histories = fetched
        .into_iter()
        .map(|(ticker, result)| result.map(|prices| (ticker, prices)))
        .collect::<AnalysisResult<HashMap<_, _>>>()?;

    let engine = state.engine.clone();
    let exposure = run_blocking("portfolio regression", move || {
        engine.portfolio_exposure(&spec, &histories, &factors)
    })
    .await??;
    Ok(Json(exposure))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_spec() -> PortfolioSpec {
        PortfolioSpec::equal_weighted(vec!["AAPL".into(), "MSFT".into()]).unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let spec = resolve_portfolio(&PortfolioQuery::default(), &default_spec()).unwrap();
        assert_eq!(spec, default_spec());
    }

    #[test]
    fn test_resolve_weights_only_uses_default_tickers() {
        let query = PortfolioQuery {
            tickers: None,
            weights: Some("0.7,0.3".into()),
        };
        let spec = resolve_portfolio(&query, &default_spec()).unwrap();
        assert_eq!(spec.tickers(), vec!["AAPL", "MSFT"]);
        assert_eq!(spec.weights(), vec![0.7, 0.3]);
    }

    #[test]
    fn test_resolve_explicit_tickers_equal_weight() {
        let query = PortfolioQuery {
            tickers: Some("spy, qqq, iwm".into()),
            weights: None,
        };
        let spec = resolve_portfolio(&query, &default_spec()).unwrap();
        assert_eq!(spec.tickers(), vec!["SPY", "QQQ", "IWM"]);
        assert!((spec.weights().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_rejects_bad_weights() {
        let query = PortfolioQuery {
            tickers: Some("AAPL,MSFT".into()),
            weights: Some("0.4,0.4".into()),
        };
        assert!(matches!(
            resolve_portfolio(&query, &default_spec()),
            Err(AnalysisError::InvalidWeights(_))
        ));

        let query = PortfolioQuery {
            tickers: Some("AAPL,MSFT".into()),
            weights: Some("half,half".into()),
        };
        assert!(matches!(
            resolve_portfolio(&query, &default_spec()),
            Err(AnalysisError::InvalidWeights(_))
        ));
    }
}
