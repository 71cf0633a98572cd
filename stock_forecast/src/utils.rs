//! Utility functions for the stock_forecast crate

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};

/// Calendar days immediately following `last_date`
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last_date;

    for _ in 0..horizon {
        current = current.checked_add_days(Days::new(1)).ok_or_else(|| {
            ForecastError::ValidationError(format!("Date overflow after {}", current))
        })?;
        dates.push(current);
    }

    Ok(dates)
}

/// History dates followed by `horizon` daily dates after the last one.
///
/// `history` must be sorted ascending; the result is sorted and duplicate free
/// as long as `history` is.
pub fn extend_dates(history: &[NaiveDate], horizon: usize) -> Result<Vec<NaiveDate>> {
    let last = history.last().copied().ok_or_else(|| {
        ForecastError::ValidationError("Cannot extend an empty date range".to_string())
    })?;

    let mut dates = history.to_vec();
    dates.extend(future_dates(last, horizon)?);
    Ok(dates)
}

/// Format a number with two decimals, the way metrics are reported
pub fn format_2dp(value: f64) -> String {
    format!("{:.2}", value)
}
