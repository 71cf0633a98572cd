//! Yahoo Finance chart and quoteSummary endpoints over blocking HTTP

use super::csv::filter_date_range;
use super::{PriceSource, ProfileSource};
use crate::config::DataConfig;
use crate::data::{days_since_epoch, RawSeries, DATE_COLUMN};
use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate};
use polars::prelude::*;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Error code the chart API uses for unknown tickers
const NOT_FOUND: &str = "Not Found";
/// Modules merged into the profile map
const PROFILE_MODULES: &str = "assetProfile,price";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    result: Option<Vec<Map<String, Value>>>,
    error: Option<ApiError>,
}

/// Yahoo Finance client
#[derive(Debug, Clone)]
pub struct YahooFinance {
    chart_url: String,
    profile_url: String,
    client: reqwest::blocking::Client,
}

impl YahooFinance {
    /// Create a client for the configured endpoints
    pub fn new(config: &DataConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            chart_url: config.chart_url.trim_end_matches('/').to_string(),
            profile_url: config.profile_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Chart URL for daily bars around `[start, end)`.
    ///
    /// Bars are stamped at exchange-local midnight, so the UTC window gets a
    /// day of margin on each side and the rows are filtered afterwards.
    fn build_chart_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Url> {
        let from = start.pred_opt().unwrap_or(start);
        let to = end.succ_opt().unwrap_or(end);

        let mut url = endpoint_url(&self.chart_url, ticker)?;
        url.query_pairs_mut()
            .append_pair("period1", &epoch_seconds(from).to_string())
            .append_pair("period2", &epoch_seconds(to).to_string())
            .append_pair("interval", "1d");
        Ok(url)
    }

    fn build_profile_url(&self, ticker: &str) -> Result<Url> {
        let mut url = endpoint_url(&self.profile_url, ticker)?;
        url.query_pairs_mut().append_pair("modules", PROFILE_MODULES);
        Ok(url)
    }

    fn get_text(&self, url: Url) -> Result<(reqwest::StatusCode, String)> {
        debug!(url = %url, "GET");
        let response = self.client.get(url).send()?;
        let status = response.status();
        let text = response.text()?;
        Ok((status, text))
    }
}

impl PriceSource for YahooFinance {
    fn fetch_prices(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<RawSeries> {
        let url = self.build_chart_url(ticker, start, end)?;
        let (status, text) = self.get_text(url)?;

        // Unknown tickers come back as 404 with a JSON error body
        let raw = match parse_chart(&text) {
            Ok(raw) => raw,
            Err(e) if !status.is_success() => {
                return Err(ForecastError::RequestError(format!(
                    "HTTP {} from chart endpoint: {}",
                    status, e
                )))
            }
            Err(e) => return Err(e),
        };
        filter_date_range(&raw, start, end)
    }
}

impl ProfileSource for YahooFinance {
    fn fetch_info(&self, ticker: &str) -> Result<Map<String, Value>> {
        let url = self.build_profile_url(ticker)?;
        let (status, text) = self.get_text(url)?;

        match parse_summary(&text) {
            Ok(info) => Ok(info),
            Err(e) if !status.is_success() => Err(ForecastError::RequestError(format!(
                "HTTP {} from profile endpoint: {}",
                status, e
            ))),
            Err(e) => Err(e),
        }
    }
}

/// `base` with the ticker appended as one encoded path segment
fn endpoint_url(base: &str, ticker: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| {
        ForecastError::ConfigError(format!("Invalid endpoint '{}': {}", base, e))
    })?;
    url.path_segments_mut()
        .map_err(|_| ForecastError::ConfigError(format!("Endpoint '{}' cannot take a path", base)))?
        .pop_if_empty()
        .push(ticker);
    Ok(url)
}

fn epoch_seconds(date: NaiveDate) -> i64 {
    days_since_epoch(date) as i64 * 86_400
}

/// Turn a chart response into a raw series.
///
/// `Not Found` errors and results without timestamps are an empty series.
/// Timestamps are shifted by the exchange offset before taking the date, and
/// when two bars land on the same date the later one wins.
fn parse_chart(json: &str) -> Result<RawSeries> {
    let response: ChartResponse = serde_json::from_str(json)?;

    if let Some(error) = response.chart.error {
        if error.code == NOT_FOUND {
            return Ok(RawSeries::empty());
        }
        return Err(ForecastError::RequestError(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let data = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(data) if !data.timestamp.is_empty() => data,
        _ => return Ok(RawSeries::empty()),
    };
    let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

    let mut days: Vec<i32> = Vec::with_capacity(data.timestamp.len());
    let mut rows: Vec<[Option<f64>; 5]> = Vec::with_capacity(data.timestamp.len());

    for (i, &ts) in data.timestamp.iter().enumerate() {
        let date = DateTime::from_timestamp(ts + data.meta.gmtoffset, 0)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| ForecastError::DataError(format!("Invalid timestamp {}", ts)))?;
        let day = days_since_epoch(date);

        let at = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
        let row = [
            at(&quote.open),
            at(&quote.high),
            at(&quote.low),
            at(&quote.close),
            at(&quote.volume),
        ];

        if days.last() == Some(&day) {
            if let Some(last) = rows.last_mut() {
                *last = row;
            }
        } else {
            days.push(day);
            rows.push(row);
        }
    }

    let column = |name: &str, idx: usize| -> Series {
        Series::new(name, rows.iter().map(|r| r[idx]).collect::<Vec<Option<f64>>>())
    };

    let df = DataFrame::new(vec![
        Series::new(DATE_COLUMN, days).cast(&DataType::Date)?,
        column("Open", 0),
        column("High", 1),
        column("Low", 2),
        column("Close", 3),
        column("Volume", 4),
    ])?;

    RawSeries::from_dataframe(df)
}

/// Merge every module of a quoteSummary result into one map
fn parse_summary(json: &str) -> Result<Map<String, Value>> {
    let response: SummaryResponse = serde_json::from_str(json)?;

    if let Some(error) = response.quote_summary.error {
        return Err(ForecastError::RequestError(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let modules = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| ForecastError::DataError("Empty quoteSummary result".to_string()))?;

    let mut info = Map::new();
    for (_, module) in modules {
        if let Value::Object(fields) = module {
            for (key, value) in fields {
                info.entry(key).or_insert(value);
            }
        }
    }
    Ok(info)
}
