//! In-sample accuracy of a forecast

use crate::data::CleanedSeries;
use crate::error::{ForecastError, Result};
use crate::models::ForecastResult;
use crate::utils::format_2dp;
use serde::Serialize;
use std::fmt;

/// Error metrics over the dates shared by the actuals and the forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Number of aligned points
    pub count: usize,
}

impl fmt::Display for AccuracyMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- MAE: {}", format_2dp(self.mae))?;
        write!(f, "- RMSE: {}", format_2dp(self.rmse))
    }
}

/// Mean absolute error between equal-length slices
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    Ok(actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n)
}

/// Root mean squared error between equal-length slices
pub fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let n = actual.len() as f64;
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;
    Ok(mse.sqrt())
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }
    Ok(())
}

/// Join actuals to the forecast on date and score `yhat` against them
pub fn score_backtest(cleaned: &CleanedSeries, forecast: &ForecastResult) -> Result<AccuracyMetrics> {
    let (actual, predicted): (Vec<f64>, Vec<f64>) = cleaned
        .observations()
        .iter()
        .filter_map(|obs| forecast.get(obs.date).map(|p| (obs.value, p.yhat)))
        .unzip();

    if actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Forecast shares no dates with the observed series".to_string(),
        ));
    }

    Ok(AccuracyMetrics {
        mae: mean_absolute_error(&actual, &predicted)?,
        rmse: root_mean_squared_error(&actual, &predicted)?,
        count: actual.len(),
    })
}
