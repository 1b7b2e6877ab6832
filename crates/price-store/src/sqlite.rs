use std::path::Path;

use analysis_core::{
    AnalysisError, AnalysisResult, FactorObservation, FactorSeries, MarketDataSource, PricePoint,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::ticker::{normalize_ticker, price_table, ticker_from_table};

pub const DEFAULT_FACTOR_TABLE: &str = "fama_french_factors";

fn upstream(e: sqlx::Error) -> AnalysisError {
    AnalysisError::UpstreamData(e.to_string())
}

/// Dates are stored as `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> AnalysisResult<NaiveDate> {
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| AnalysisError::InvalidData(format!("unparseable date '{}'", raw)))
}

/// Price and factor history held in a SQLite database: one `{TICKER}_daily`
/// table per symbol plus a factor table.
#[derive(Clone)]
pub struct SqlitePriceStore {
    pool: SqlitePool,
    factor_table: String,
}

impl SqlitePriceStore {
    /// Open (or create) the database file at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open {}", path.display()))?;
        tracing::info!("Opened price database at {}", path.display());
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            factor_table: DEFAULT_FACTOR_TABLE.to_string(),
        }
    }

    pub fn with_factor_table(mut self, table: &str) -> AnalysisResult<Self> {
        let valid = !table.is_empty()
            && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(AnalysisError::InvalidData(format!(
                "invalid factor table name '{}'",
                table
            )));
        }
        self.factor_table = table.to_string();
        Ok(self)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn table_exists(&self, name: &str) -> AnalysisResult<bool> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(upstream)?;
        Ok(row.is_some())
    }

    /// Replace the stored history for `ticker`.
    pub async fn save_price_history(
        &self,
        ticker: &str,
        prices: &[PricePoint],
    ) -> AnalysisResult<()> {
        let ticker = normalize_ticker(ticker)?;
        let table = price_table(&ticker);

        let mut tx = self.pool.begin().await.map_err(upstream)?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&mut *tx)
            .await
            .map_err(upstream)?;
        sqlx::query(&format!("CREATE TABLE {} (Date TEXT NOT NULL, Close REAL)", table))
            .execute(&mut *tx)
            .await
            .map_err(upstream)?;
        let insert = format!("INSERT INTO {} (Date, Close) VALUES (?, ?)", table);
        for p in prices {
            sqlx::query(&insert)
                .bind(p.date.format("%Y-%m-%d").to_string())
                .bind(p.close)
                .execute(&mut *tx)
                .await
                .map_err(upstream)?;
        }
        tx.commit().await.map_err(upstream)?;

        tracing::info!("Saved {} rows to {}", prices.len(), table);
        Ok(())
    }

    /// Replace the stored factor table.
    pub async fn save_factor_returns(&self, factors: &FactorSeries) -> AnalysisResult<()> {
        let table = format!("\"{}\"", self.factor_table);

        let mut tx = self.pool.begin().await.map_err(upstream)?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&mut *tx)
            .await
            .map_err(upstream)?;
        sqlx::query(&format!(
            "CREATE TABLE {} (Date TEXT NOT NULL, MKT REAL, SMB REAL, HML REAL)",
            table
        ))
        .execute(&mut *tx)
        .await
        .map_err(upstream)?;
        let insert = format!("INSERT INTO {} (Date, MKT, SMB, HML) VALUES (?, ?, ?, ?)", table);
        for row in factors.rows() {
            sqlx::query(&insert)
                .bind(row.date.format("%Y-%m-%d").to_string())
                .bind(row.mkt)
                .bind(row.smb)
                .bind(row.hml)
                .execute(&mut *tx)
                .await
                .map_err(upstream)?;
        }
        tx.commit().await.map_err(upstream)?;

        tracing::info!("Saved {} factor rows to {}", factors.len(), table);
        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for SqlitePriceStore {
    async fn list_tickers(&self) -> AnalysisResult<Vec<String>> {
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE '%\\_daily' ESCAPE '\\'",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(upstream)?;

        let mut tickers: Vec<String> = tables
            .iter()
            .filter_map(|(name,)| ticker_from_table(name))
            .collect();
        tickers.sort();
        Ok(tickers)
    }

    async fn price_history(&self, ticker: &str) -> AnalysisResult<Vec<PricePoint>> {
        let ticker = normalize_ticker(ticker)?;
        let table = price_table(&ticker);
        if !self.table_exists(&format!("{}_daily", ticker)).await? {
            return Err(AnalysisError::UnknownTicker(ticker));
        }

        let rows: Vec<(String, Option<f64>)> =
            sqlx::query_as(&format!("SELECT Date, Close FROM {} ORDER BY Date", table))
                .fetch_all(&self.pool)
                .await
                .map_err(upstream)?;

        let mut points = Vec::with_capacity(rows.len());
        for (date, close) in rows {
            // Rows without a close (halted sessions) are skipped.
            if let Some(close) = close {
                points.push(PricePoint::new(parse_date(&date)?, close));
            }
        }
        tracing::debug!("Loaded {} prices for {}", points.len(), ticker);
        Ok(points)
    }

    async fn factor_returns(&self) -> AnalysisResult<FactorSeries> {
        if !self.table_exists(&self.factor_table).await? {
            return Err(AnalysisError::UpstreamData(format!(
                "factor table '{}' is missing",
                self.factor_table
            )));
        }

        let rows: Vec<(String, f64, f64, f64)> = sqlx::query_as(&format!(
            "SELECT Date, MKT, SMB, HML FROM \"{}\" ORDER BY Date",
            self.factor_table
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(upstream)?;

        let observations = rows
            .into_iter()
            .map(|(date, mkt, smb, hml)| {
                Ok(FactorObservation {
                    date: parse_date(&date)?,
                    mkt,
                    smb,
                    hml,
                })
            })
            .collect::<AnalysisResult<Vec<_>>>()?;
        FactorSeries::new(observations)
    }
}
