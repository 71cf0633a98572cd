//! Error types for the stock_forecast crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the stock_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error talking to a remote data service
    #[error("Request error: {0}")]
    RequestError(String),

    /// Error in the configuration file or values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<MathError> for ForecastError {
    fn from(err: MathError) -> Self {
        ForecastError::ForecastingError(err.to_string())
    }
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        ForecastError::RequestError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::DataError(format!("Malformed JSON: {}", err))
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

/// Conditions that halt a pipeline run.
///
/// Each one is terminal for the current request only; the next request
/// starts again from the profile fetch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The price service returned no rows for the ticker and range
    #[error("No data found for the selected ticker and date range. Please try a different combination.")]
    EmptySeries,

    /// The price service itself failed
    #[error("Could not retrieve price data: {0}")]
    DataServiceFailure(String),

    /// The requested price field is not a column of the retrieved series
    #[error("Column '{column}' not found in data. Available columns: {available:?}")]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    /// Every row was dropped while coercing the price field to numbers
    #[error("No valid data available for forecasting after cleaning. Please try a different ticker, date range, or price column.")]
    EmptyAfterCleaning,

    /// The forecasting model failed to fit or predict
    #[error("An error occurred during forecasting: {0}")]
    ForecastingFailure(String),
}

/// Non-fatal conditions reported alongside a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineWarning {
    #[error("Could not fetch stock summary information.")]
    MetadataUnavailable(String),
}

impl PipelineWarning {
    /// Underlying cause, for logs
    pub fn detail(&self) -> &str {
        match self {
            PipelineWarning::MetadataUnavailable(detail) => detail,
        }
    }
}
