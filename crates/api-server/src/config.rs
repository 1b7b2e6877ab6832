use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use quant_analysis::AnalysisConfig;

/// Server settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_path: String,
    pub bind_addr: SocketAddr,
    pub factor_table: String,
    pub analysis: AnalysisConfig,
    /// Portfolio used when `/api/portfolio-analysis` gets no `tickers`.
    pub portfolio_tickers: Vec<String>,
    /// `None` means equal weights.
    pub portfolio_weights: Option<Vec<f64>>,
    pub request_timeout: Duration,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    pub json_logs: bool,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let analysis = AnalysisConfig {
            histogram_bins: parse_or(&lookup, "HISTOGRAM_BINS", 20)?,
            acf_lags: parse_or(&lookup, "ACF_LAGS", 30)?,
            risk_free_rate_annual: parse_or(&lookup, "RISK_FREE_RATE", 0.05)?,
            min_observations: parse_or(&lookup, "MIN_OBSERVATIONS", 3)?,
        };
        analysis.validate().context("invalid analysis settings")?;

        let portfolio_weights = match lookup("PORTFOLIO_WEIGHTS") {
            Some(raw) => Some(
                split_list(&raw)
                    .iter()
                    .map(|w| w.parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("PORTFOLIO_WEIGHTS has an invalid value '{}'", raw))?,
            ),
            None => None,
        };

        let config = Self {
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "market_data.db".to_string()),
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8000)))?,
            factor_table: lookup("FACTOR_TABLE")
                .unwrap_or_else(|| price_store::DEFAULT_FACTOR_TABLE.to_string()),
            analysis,
            portfolio_tickers: split_list(
                &lookup("PORTFOLIO_TICKERS").unwrap_or_else(|| "AAPL,MSFT,TSLA".to_string()),
            ),
            portfolio_weights,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            cors_origins: lookup("CORS_ORIGINS").map(|raw| split_list(&raw)),
            json_logs: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(config.portfolio_tickers, vec!["AAPL", "MSFT", "TSLA"]);
        assert!(config.portfolio_weights.is_none());
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.factor_table, "fama_french_factors");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HISTOGRAM_BINS", "40"),
            ("RISK_FREE_RATE", "0.03"),
            ("PORTFOLIO_TICKERS", "SPY, QQQ"),
            ("PORTFOLIO_WEIGHTS", "0.6,0.4"),
            ("CORS_ORIGINS", "http://localhost:3000"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.analysis.histogram_bins, 40);
        assert_eq!(config.analysis.risk_free_rate_annual, 0.03);
        assert_eq!(config.portfolio_tickers, vec!["SPY", "QQQ"]);
        assert_eq!(config.portfolio_weights, Some(vec![0.6, 0.4]));
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://localhost:3000".to_string()])
        );
        assert!(config.json_logs);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config_from(&[("HISTOGRAM_BINS", "many")]).is_err());
        assert!(config_from(&[("HISTOGRAM_BINS", "0")]).is_err());
        assert!(config_from(&[("PORTFOLIO_WEIGHTS", "0.5,abc")]).is_err());
        assert!(config_from(&[("BIND_ADDR", "localhost")]).is_err());
    }
}
