//! Forecast requests collected from the user

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest accepted forecast horizon, in days
pub const MIN_HORIZON_DAYS: u32 = 1;
/// Largest accepted forecast horizon, in days
pub const MAX_HORIZON_DAYS: u32 = 365;

/// Price column to forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl PriceField {
    /// Column name used by the price providers
    pub fn column_name(&self) -> &'static str {
        match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for PriceField {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            other => Err(ForecastError::ValidationError(format!(
                "Unknown price field '{}', expected one of Open, High, Low, Close",
                other
            ))),
        }
    }
}

/// Immutable set of parameters for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    ticker: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    price_field: PriceField,
    horizon_days: u32,
}

impl ForecastRequest {
    /// Create a request, enforcing the input bounds
    pub fn new(
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price_field: PriceField,
        horizon_days: u32,
    ) -> Result<Self> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(ForecastError::ValidationError(
                "Ticker must not be empty".to_string(),
            ));
        }
        if start_date > end_date {
            return Err(ForecastError::ValidationError(format!(
                "Start date {} is after end date {}",
                start_date, end_date
            )));
        }
        validate_horizon(horizon_days)?;

        Ok(Self {
            ticker: ticker.to_string(),
            start_date,
            end_date,
            price_field,
            horizon_days,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn price_field(&self) -> PriceField {
        self.price_field
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Copy of this request with a different ticker
    pub fn with_ticker(&self, ticker: &str) -> Result<Self> {
        Self::new(
            ticker,
            self.start_date,
            self.end_date,
            self.price_field,
            self.horizon_days,
        )
    }

    /// Copy of this request with a different start date
    pub fn with_start_date(&self, start_date: NaiveDate) -> Result<Self> {
        Self::new(
            &self.ticker,
            start_date,
            self.end_date,
            self.price_field,
            self.horizon_days,
        )
    }

    /// Copy of this request with a different end date
    pub fn with_end_date(&self, end_date: NaiveDate) -> Result<Self> {
        Self::new(
            &self.ticker,
            self.start_date,
            end_date,
            self.price_field,
            self.horizon_days,
        )
    }

    /// Copy of this request with a different price field
    pub fn with_price_field(&self, price_field: PriceField) -> Result<Self> {
        Self::new(
            &self.ticker,
            self.start_date,
            self.end_date,
            price_field,
            self.horizon_days,
        )
    }

    /// Copy of this request with a different horizon
    pub fn with_horizon_days(&self, horizon_days: u32) -> Result<Self> {
        Self::new(
            &self.ticker,
            self.start_date,
            self.end_date,
            self.price_field,
            horizon_days,
        )
    }
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            ticker: "AAPL".to_string(),
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            price_field: PriceField::Close,
            horizon_days: 30,
        }
    }
}

impl fmt::Display for ForecastRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {} to {}, {} day horizon",
            self.ticker, self.price_field, self.start_date, self.end_date, self.horizon_days
        )
    }
}

/// Check a horizon against the accepted range
pub fn validate_horizon(horizon_days: u32) -> Result<()> {
    if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Err(ForecastError::ValidationError(format!(
            "Forecast horizon must be between {} and {} days, got {}",
            MIN_HORIZON_DAYS, MAX_HORIZON_DAYS, horizon_days
        )));
    }
    Ok(())
}
