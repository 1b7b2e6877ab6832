use std::collections::BTreeMap;

use analysis_core::{AnalysisError, AnalysisResult, FactorSeries, MarketDataSource, PricePoint};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ticker::normalize_ticker;

/// `MarketDataSource` backed by process memory. Used for tests and demos.
#[derive(Default)]
pub struct InMemoryStore {
    prices: RwLock<BTreeMap<String, Vec<PricePoint>>>,
    factors: RwLock<Option<FactorSeries>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_prices(&self, ticker: &str, prices: Vec<PricePoint>) -> AnalysisResult<()> {
        let ticker = normalize_ticker(ticker)?;
        self.prices.write().await.insert(ticker, prices);
        Ok(())
    }

    pub async fn set_factors(&self, factors: FactorSeries) {
        *self.factors.write().await = Some(factors);
    }
}

#[async_trait]
impl MarketDataSource for InMemoryStore {
    async fn list_tickers(&self) -> AnalysisResult<Vec<String>> {
        Ok(self.prices.read().await.keys().cloned().collect())
    }

    async fn price_history(&self, ticker: &str) -> AnalysisResult<Vec<PricePoint>> {
        let ticker = normalize_ticker(ticker)?;
        self.prices
            .read()
            .await
            .get(&ticker)
            .cloned()
            .ok_or(AnalysisError::UnknownTicker(ticker))
    }

    async fn factor_returns(&self) -> AnalysisResult<FactorSeries> {
        self.factors
            .read()
            .await
            .clone()
            .ok_or_else(|| AnalysisError::UpstreamData("no factor returns loaded".to_string()))
    }
}
