use analysis_core::{AnalysisError, AnalysisResult};

/// Suffix of per-ticker price tables (`AAPL_daily`).
pub const DAILY_SUFFIX: &str = "_daily";

const MAX_TICKER_LEN: usize = 15;

/// Normalise a ticker symbol to upper case and reject anything that could not
/// safely be spliced into a table name.
pub fn normalize_ticker(raw: &str) -> AnalysisResult<String> {
    let ticker = raw.trim().to_ascii_uppercase();
    let valid_chars = ticker
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '-'));
    if ticker.is_empty() || ticker.len() > MAX_TICKER_LEN || !valid_chars {
        return Err(AnalysisError::InvalidData(format!(
            "invalid ticker symbol '{}'",
            raw
        )));
    }
    Ok(ticker)
}

/// Quoted SQLite identifier for a ticker's price table.
pub fn price_table(ticker: &str) -> String {
    format!("\"{}{}\"", ticker, DAILY_SUFFIX)
}

/// Ticker encoded in a table name, if it is a valid price table.
pub fn ticker_from_table(table: &str) -> Option<String> {
    let ticker = table.strip_suffix(DAILY_SUFFIX)?;
    normalize_ticker(ticker).ok().filter(|t| t == ticker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_ticker("BRK.B").unwrap(), "BRK.B");
        assert_eq!(normalize_ticker("^GSPC").unwrap(), "^GSPC");
        assert!(normalize_ticker("").is_err());
        assert!(normalize_ticker("AAPL\"; DROP TABLE x").is_err());
        assert!(normalize_ticker("ABCDEFGHIJKLMNOP").is_err());
    }

    #[test]
    fn test_table_names() {
        assert_eq!(price_table("MSFT"), "\"MSFT_daily\"");
        assert_eq!(ticker_from_table("MSFT_daily").as_deref(), Some("MSFT"));
        assert_eq!(ticker_from_table("fama_french_factors"), None);
        assert_eq!(ticker_from_table("msft_daily"), None);
    }
}
