pub mod config;
pub mod dashboard_routes;
pub mod error;
pub mod factor_routes;
pub mod request_id;


use std::collections::BTreeMap;
use std::sync::Arc;

use analysis_core::{AnalysisResult, MarketDataSource, PortfolioSpec, PricePoint};
use anyhow::Context;
use axum::{http::HeaderValue, middleware, routing::get, Json, Router};
use futures_util::future::join_all;
use price_store::SqlitePriceStore;
use quant_analysis::{Outcome, QuantAnalysisEngine};
use serde_json::json;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::ServerConfig;
pub use error::AppError;

use crate::dashboard_routes::dashboard_routes;
use crate::factor_routes::factor_routes;
use crate::request_id::{request_id_middleware, request_span};

const DEFAULT_LOG_FILTER: &str =
    "api_server=info,quant_analysis=info,price_store=info,tower_http=info";

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn MarketDataSource>,
    pub engine: Arc<QuantAnalysisEngine>,
    /// Portfolio analysed when a request names no tickers.
    pub default_portfolio: PortfolioSpec,
}

impl AppState {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        engine: QuantAnalysisEngine,
        default_portfolio: PortfolioSpec,
    ) -> Self {
        Self {
            source,
            engine: Arc::new(engine),
            default_portfolio,
        }
    }
}

/// Fetch price histories for `tickers` concurrently, keeping each result.
pub(crate) async fn fetch_histories(
    source: &dyn MarketDataSource,
    tickers: &[String],
) -> Vec<(String, AnalysisResult<Vec<PricePoint>>)> {
    let fetches = tickers.iter().map(|t| async move {
        let result = source.price_history(t).await;
        (t.clone(), result)
    });
    join_all(fetches).await
}

/// Split fetched histories into loadable ones and pre-filled error slots.
pub(crate) fn partition_fetched<T>(
    fetched: Vec<(String, AnalysisResult<Vec<PricePoint>>)>,
) -> (Vec<(String, Vec<PricePoint>)>, BTreeMap<String, Outcome<T>>) {
    let mut loaded = Vec::with_capacity(fetched.len());
    let mut failed = BTreeMap::new();
    for (ticker, result) in fetched {
        match result {
            Ok(prices) => loaded.push((ticker, prices)),
            Err(e) => {
                tracing::warn!("Could not load prices for {}: {}", ticker, e);
                failed.insert(ticker, Outcome::Failed { error: e.to_string() });
            }
        }
    }
    (loaded, failed)
}

/// Run CPU-bound engine work off the async workers.
pub(crate) async fn run_blocking<T, F>(label: &str, work: F) -> Result<T, AppError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::from(anyhow::anyhow!("{} task failed: {}", label, e)))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// All routes plus request-ID propagation. Transport layers (tracing, CORS,
/// timeout) are added by [`run_server`].
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(dashboard_routes())
        .merge(factor_routes())
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
}

fn cors_layer(origins: Option<&[String]>) -> anyhow::Result<CorsLayer> {
    let origin = match origins {
        Some(list) => {
            let values = list
                .iter()
                .map(|o| HeaderValue::from_str(o).with_context(|| format!("bad CORS origin {}", o)))
                .collect::<anyhow::Result<Vec<_>>>()?;
            AllowOrigin::list(values)
        }
        None => AllowOrigin::any(),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

pub fn init_tracing(json_logs: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_tracing(config.json_logs);

    let store = SqlitePriceStore::connect(&config.database_path)
        .await?
        .with_factor_table(&config.factor_table)?;

    let default_portfolio = match &config.portfolio_weights {
        Some(weights) => PortfolioSpec::new(config.portfolio_tickers.clone(), weights.clone()),
        None => PortfolioSpec::equal_weighted(config.portfolio_tickers.clone()),
    }
    .context("invalid default portfolio (PORTFOLIO_TICKERS / PORTFOLIO_WEIGHTS)")?;

    let state = AppState::new(
        Arc::new(store),
        QuantAnalysisEngine::with_config(config.analysis.clone()),
        default_portfolio,
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(cors_layer(config.cors_origins.as_deref())?);

    tracing::info!(
        "ReturnScope API v{} listening on {} (database: {})",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr,
        config.database_path
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
