//! Sources of daily prices and company metadata

use crate::data::RawSeries;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

pub mod csv;
pub mod yahoo;

pub use self::csv::CsvPriceSource;
pub use self::yahoo::YahooFinance;

/// Daily OHLCV history for a ticker
pub trait PriceSource {
    /// Rows dated in `[start, end)`, ascending. An unknown ticker yields an empty series.
    fn fetch_prices(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<RawSeries>;
}

/// Unstructured company metadata for a ticker
pub trait ProfileSource {
    fn fetch_info(&self, ticker: &str) -> Result<Map<String, Value>>;
}

impl<T: PriceSource + ?Sized> PriceSource for Box<T> {
    fn fetch_prices(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<RawSeries> {
        (**self).fetch_prices(ticker, start, end)
    }
}

impl<T: ProfileSource + ?Sized> ProfileSource for Box<T> {
    fn fetch_info(&self, ticker: &str) -> Result<Map<String, Value>> {
        (**self).fetch_info(ticker)
    }
}

/// Profile source for offline runs; every lookup fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProfile;

impl ProfileSource for NoProfile {
    fn fetch_info(&self, ticker: &str) -> Result<Map<String, Value>> {
        Err(crate::error::ForecastError::DataError(format!(
            "No profile source configured for {}",
            ticker
        )))
    }
}

/// Fallback for missing name, sector and industry
pub const NOT_AVAILABLE: &str = "N/A";
/// Fallback for a missing business summary
pub const NO_SUMMARY: &str = "No summary available.";

/// Company summary shown above the charts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyProfile {
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub summary: String,
}

impl CompanyProfile {
    /// Pick the displayed fields out of a metadata map, with fallbacks
    pub fn from_info(info: &Map<String, Value>) -> Self {
        Self {
            name: text_field(info, "longName").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            sector: text_field(info, "sector").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            industry: text_field(info, "industry").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            summary: text_field(info, "longBusinessSummary")
                .unwrap_or_else(|| NO_SUMMARY.to_string()),
        }
    }
}

fn text_field(info: &Map<String, Value>, key: &str) -> Option<String> {
    match info.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
