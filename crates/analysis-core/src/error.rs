use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Sample too small for a statistic or an underdetermined regression.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Zero variance (or a singular design matrix); higher moments are undefined.
    #[error("Degenerate series: {0}")]
    DegenerateSeries(String),

    /// Asset and factor series do not share the required dates.
    #[error("Factor alignment error: {0}")]
    FactorAlignment(String),

    #[error("Invalid portfolio weights: {0}")]
    InvalidWeights(String),

    /// Price or factor history could not be loaded from the data source.
    #[error("Upstream data error: {0}")]
    UpstreamData(String),

    #[error("Ticker {0} not found")]
    UnknownTicker(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
