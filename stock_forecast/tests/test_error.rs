use stock_forecast::error::{ForecastError, PipelineError};
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        ForecastError::from(json_error),
        ForecastError::DataError(_)
    ));

    let toml_error = toml::from_str::<toml::Value>("= broken").unwrap_err();
    assert!(matches!(
        ForecastError::from(toml_error),
        ForecastError::ConfigError(_)
    ));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InvalidParameter("interval_width must be in (0, 1)".to_string());
    assert_eq!(
        error.to_string(),
        "Invalid parameter: interval_width must be in (0, 1)"
    );
}

#[test]
fn test_pipeline_banners() {
    assert_eq!(
        PipelineError::EmptyAfterCleaning.to_string(),
        "No valid data available for forecasting after cleaning. Please try a different ticker, date range, or price column."
    );
    assert_eq!(
        PipelineError::ForecastingFailure("singular system".to_string()).to_string(),
        "An error occurred during forecasting: singular system"
    );
}
