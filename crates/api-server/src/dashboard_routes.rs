use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use price_store::normalize_ticker;
use quant_analysis::{BatchPayload, TickerAnalysis};
use serde::Serialize;

use crate::{fetch_histories, partition_fetched, run_blocking, AppError, AppState};

#[derive(Serialize)]
pub struct TickerResponse {
    pub ticker: String,
    pub data: TickerAnalysis,
    pub timestamp: String,
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/data", get(get_dashboard_data))
        .route("/api/ticker/:ticker", get(get_ticker_data))
}

/// Analysis for every stored ticker. A ticker that fails gets an error slot.
async fn get_dashboard_data(
    State(state): State<AppState>,
) -> Result<Json<BatchPayload<TickerAnalysis>>, AppError> {
    let tickers = state.source.list_tickers().await?;
    tracing::info!("Analyzing {} tickers", tickers.len());

    let fetched = fetch_histories(state.source.as_ref(), &tickers).await;
    let (loaded, failed) = partition_fetched(fetched);

    let engine = state.engine.clone();
    let mut results = run_blocking("analysis", move || engine.analyze_batch(&loaded)).await?;
    results.extend(failed);

    Ok(Json(BatchPayload::new(results)))
}

async fn get_ticker_data(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<TickerResponse>, AppError> {
    let ticker = normalize_ticker(&ticker)?;
    let prices = state.source.price_history(&ticker).await?;
    let engine = state.engine.clone();
    let data = run_blocking("analysis", move || engine.analyze_ticker(&prices)).await??;

    Ok(Json(TickerResponse {
        ticker,
        data,
        timestamp: Utc::now().to_rfc3339(),
    }))
}
