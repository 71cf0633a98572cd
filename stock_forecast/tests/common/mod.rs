#![allow(dead_code)]

use chrono::{Datelike, Days, NaiveDate, Weekday};
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::cell::Cell;
use std::rc::Rc;
use stock_forecast::config::ModelConfig;
use stock_forecast::data::{days_since_epoch, CleanedSeries, RawSeries};
use stock_forecast::models::additive::{AdditiveModel, TrainedAdditiveModel};
use stock_forecast::providers::{PriceSource, ProfileSource};
use stock_forecast::{ForecastError, ForecastModel};

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// `count` consecutive weekdays starting at `start`
pub fn weekdays(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = start;
    while dates.len() < count {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current = current.checked_add_days(Days::new(1)).unwrap();
    }
    dates
}

/// Trending, wobbling closes for a trading-year-like history
pub fn synthetic_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let i = i as f64;
            150.0 + 0.08 * i + 4.0 * (i / 9.0).sin() + ((i * 37.0) % 11.0) * 0.15
        })
        .collect()
}

/// OHLCV frame around the given closes
pub fn ohlcv_frame(dates: &[NaiveDate], closes: &[f64]) -> DataFrame {
    let days: Vec<i32> = dates.iter().map(|d| days_since_epoch(*d)).collect();
    let opens: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();
    let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
    let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();
    let volumes: Vec<f64> = (0..closes.len()).map(|i| 1_000_000.0 + i as f64).collect();

    DataFrame::new(vec![
        Series::new("Date", days).cast(&DataType::Date).unwrap(),
        Series::new("Open", opens),
        Series::new("High", highs),
        Series::new("Low", lows),
        Series::new("Close", closes.to_vec()),
        Series::new("Volume", volumes),
    ])
    .unwrap()
}

/// 252 weekday rows from 2022-01-03
pub fn trading_year() -> RawSeries {
    let dates = weekdays(date("2022-01-03"), 252);
    let closes = synthetic_closes(252);
    RawSeries::from_dataframe(ohlcv_frame(&dates, &closes)).unwrap()
}

pub fn cleaned_trading_year() -> CleanedSeries {
    let dates = weekdays(date("2022-01-03"), 252);
    CleanedSeries::from_parts(&dates, &synthetic_closes(252)).unwrap()
}

/// Price source returning a fixed series and counting calls
#[derive(Debug, Clone)]
pub struct StaticPrices {
    pub series: RawSeries,
    pub calls: Rc<Cell<usize>>,
}

impl StaticPrices {
    pub fn new(series: RawSeries) -> Self {
        Self {
            series,
            calls: Rc::new(Cell::new(0)),
        }
    }
}

impl PriceSource for StaticPrices {
    fn fetch_prices(
        &self,
        _ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> stock_forecast::error::Result<RawSeries> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.series.clone())
    }
}

/// Price source whose service is down
#[derive(Debug, Clone, Copy)]
pub struct BrokenPrices;

impl PriceSource for BrokenPrices {
    fn fetch_prices(
        &self,
        ticker: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> stock_forecast::error::Result<RawSeries> {
        Err(ForecastError::RequestError(format!(
            "connection refused for {}",
            ticker
        )))
    }
}

/// Profile source answering with a fixed map, or failing when `None`
#[derive(Debug, Clone)]
pub struct StaticProfile(pub Option<Map<String, Value>>);

impl StaticProfile {
    pub fn apple() -> Self {
        match json!({
            "longName": "Apple Inc.",
            "sector": "Technology",
            "industry": "Consumer Electronics",
            "longBusinessSummary": "Apple designs smartphones."
        }) {
            Value::Object(map) => Self(Some(map)),
            _ => unreachable!(),
        }
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl ProfileSource for StaticProfile {
    fn fetch_info(&self, _ticker: &str) -> stock_forecast::error::Result<Map<String, Value>> {
        self.0
            .clone()
            .ok_or_else(|| ForecastError::RequestError("HTTP 401 Unauthorized".to_string()))
    }
}

/// Additive model that counts how often it is trained
#[derive(Debug, Clone)]
pub struct CountingModel {
    pub inner: AdditiveModel,
    pub trained: Rc<Cell<usize>>,
}

impl CountingModel {
    pub fn new() -> Self {
        Self {
            inner: fast_model(),
            trained: Rc::new(Cell::new(0)),
        }
    }
}

impl ForecastModel for CountingModel {
    type Trained = TrainedAdditiveModel;

    fn train(&self, data: &CleanedSeries) -> stock_forecast::error::Result<Self::Trained> {
        self.trained.set(self.trained.get() + 1);
        self.inner.train(data)
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Default model with fewer simulated paths
pub fn fast_model() -> AdditiveModel {
    AdditiveModel::new(ModelConfig {
        uncertainty_samples: 200,
        ..ModelConfig::default()
    })
    .unwrap()
}
