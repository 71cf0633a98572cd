use chrono::{Datelike, Days, NaiveDate, Weekday};
use polars::prelude::*;
use stock_forecast::config::DisplayConfig;
use stock_forecast::data::{days_since_epoch, RawSeries};
use stock_forecast::models::additive::AdditiveModel;
use stock_forecast::pipeline::ForecastPipeline;
use stock_forecast::providers::{NoProfile, PriceSource};
use stock_forecast::render::{render_run, TextRenderer};
use stock_forecast::request::{ForecastRequest, PriceField};

/// Price source generating a trending weekday series for any ticker
#[derive(Debug)]
struct SyntheticPrices;

impl PriceSource for SyntheticPrices {
    fn fetch_prices(
        &self,
        _ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> stock_forecast::error::Result<RawSeries> {
        let mut days = Vec::new();
        let mut closes = Vec::new();
        let mut current = start;
        while current < end {
            if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                let i = days.len() as f64;
                days.push(days_since_epoch(current));
                closes.push(120.0 + 0.1 * i + 3.0 * (i / 7.0).sin());
            }
            current = match current.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }
        let opens: Vec<f64> = closes.iter().map(|c| c - 0.4).collect();

        let df = DataFrame::new(vec![
            Series::new("Date", days).cast(&DataType::Date)?,
            Series::new("Open", opens),
            Series::new("Close", closes),
        ])?;
        RawSeries::from_dataframe(df)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Stock Forecast: Offline Example");
    println!("===============================\n");

    let pipeline = ForecastPipeline::new(SyntheticPrices, NoProfile, AdditiveModel::default());
    let request = ForecastRequest::new(
        "DEMO",
        NaiveDate::from_ymd_opt(2022, 1, 1).ok_or("invalid start date")?,
        NaiveDate::from_ymd_opt(2023, 1, 1).ok_or("invalid end date")?,
        PriceField::Close,
        30,
    )?;

    let run = pipeline.run(&request);
    let mut renderer = TextRenderer::new(std::io::stdout(), DisplayConfig::default());
    render_run(&mut renderer, &run)?;

    // Asking for a column the source does not provide halts after the fetch
    let run = pipeline.run(&request.with_price_field(PriceField::High)?);
    if let Some(error) = run.error() {
        println!("\nHigh prices: {}", error);
    }

    Ok(())
}
