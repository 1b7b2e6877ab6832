use async_trait::async_trait;
use crate::{AnalysisResult, FactorSeries, PricePoint};

/// Source of historical prices and factor returns.
///
/// Implementations must return prices ordered by ascending date.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Every ticker with stored price history, sorted.
    async fn list_tickers(&self) -> AnalysisResult<Vec<String>>;

    async fn price_history(&self, ticker: &str) -> AnalysisResult<Vec<PricePoint>>;

    /// Daily Fama-French factor returns.
    async fn factor_returns(&self) -> AnalysisResult<FactorSeries>;
}
