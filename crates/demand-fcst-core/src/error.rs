//! Error types for the demand forecasting core.

use thiserror::Error;

/// Result type for demand forecasting operations.
pub type Result<T> = std::result::Result<T, DemandError>;

/// Error types for demand forecasting operations.
#[derive(Error, Debug)]
pub enum DemandError {
    #[error("Unknown granularity code: {0}. Valid codes: H, D, W, M, Y")]
    UnknownGranularity(String),

    #[error("Invalid aggregator: {0}. Valid aggregators: sum, mean, max, min")]
    InvalidAggregator(String),

    #[error("No data available: {0}")]
    NoDataAvailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
