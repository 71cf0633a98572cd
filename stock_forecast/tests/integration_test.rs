mod common;

use common::*;
use std::io::Write;
use stock_forecast::config::AppConfig;
use stock_forecast::models::additive::AdditiveModel;
use stock_forecast::pipeline::ForecastPipeline;
use stock_forecast::providers::csv::write_forecast_csv;
use stock_forecast::providers::{CsvPriceSource, NoProfile};
use stock_forecast::request::{ForecastRequest, PriceField};
use tempfile::TempDir;

#[test]
fn test_full_offline_workflow() {
    // 1. Write a year of prices as a CSV export
    let dir = TempDir::new().unwrap();
    let dates = weekdays(date("2022-01-03"), 252);
    let closes = synthetic_closes(252);
    let mut file = std::fs::File::create(dir.path().join("ACME.csv")).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Volume").unwrap();
    for (d, c) in dates.iter().zip(&closes) {
        writeln!(file, "{},{},{},{},{},1000", d, c - 0.5, c + 1.0, c - 1.0, c).unwrap();
    }
    drop(file);

    // 2. Configure a lighter model through TOML
    let config = AppConfig::from_toml_str("[model]\nuncertainty_samples = 100\nseed = 7").unwrap();
    let model = AdditiveModel::new(config.model.clone()).unwrap();
    let pipeline = ForecastPipeline::new(CsvPriceSource::new(dir.path()), NoProfile, model);

    // 3. Run
    let request =
        ForecastRequest::new("acme", date("2022-01-01"), date("2023-01-01"), PriceField::Close, 14)
            .unwrap();
    let run = pipeline.run(&request);
    let artifacts = run.artifacts().expect("run should succeed");
    assert_eq!(artifacts.forecast.len(), 252 + 14);
    assert_eq!(run.warnings.len(), 1);

    // 4. Export
    let out = dir.path().join("forecast.csv");
    write_forecast_csv(&artifacts.forecast, &out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("ds,yhat,yhat_lower,yhat_upper,trend,seasonal"));
    assert_eq!(lines.count(), 266);
    assert!(text.contains("\n2022-01-03,"));
}

#[test]
fn test_unknown_ticker_is_empty_series() {
    let dir = TempDir::new().unwrap();
    let pipeline = ForecastPipeline::new(CsvPriceSource::new(dir.path()), NoProfile, fast_model());
    let run = pipeline.run(&ForecastRequest::default());
    assert_eq!(
        run.error(),
        Some(&stock_forecast::PipelineError::EmptySeries)
    );
}
