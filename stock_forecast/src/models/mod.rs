//! Forecasting models for daily price series

use crate::data::{days_since_epoch, CleanedSeries};
use crate::error::{ForecastError, Result};
use crate::utils::extend_dates;
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::fmt::Debug;

/// One row of a forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    /// Predicted value (fitted value for in-sample dates)
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// Trend component of `yhat`
    pub trend: f64,
    /// Seasonal component of `yhat`
    pub seasonal: f64,
}

/// Forecast over the history plus a number of future dates
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
    /// Number of leading points that fall inside the training history
    history_len: usize,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(points: Vec<ForecastPoint>, history_len: usize) -> Result<Self> {
        if history_len > points.len() {
            return Err(ForecastError::ValidationError(format!(
                "History length ({}) exceeds number of points ({})",
                history_len,
                points.len()
            )));
        }

        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(ForecastError::ValidationError(format!(
                "Forecast dates must be strictly increasing, got {} then {}",
                pair[0].date, pair[1].date
            )));
        }

        if let Some(p) = points.iter().find(|p| p.yhat_lower > p.yhat_upper) {
            return Err(ForecastError::ValidationError(format!(
                "Lower bound {} above upper bound {} on {}",
                p.yhat_lower, p.yhat_upper, p.date
            )));
        }

        Ok(Self {
            points,
            history_len,
        })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of in-sample points
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Number of out-of-sample points
    pub fn horizon(&self) -> usize {
        self.points.len() - self.history_len
    }

    /// In-sample points
    pub fn history(&self) -> &[ForecastPoint] {
        &self.points[..self.history_len]
    }

    /// Out-of-sample points
    pub fn future(&self) -> &[ForecastPoint] {
        &self.points[self.history_len..]
    }

    /// Last `n` points (all of them if there are fewer)
    pub fn tail(&self, n: usize) -> &[ForecastPoint] {
        &self.points[self.points.len().saturating_sub(n)..]
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.yhat).collect()
    }

    /// Point for a date, if the forecast covers it
    pub fn get(&self, date: NaiveDate) -> Option<&ForecastPoint> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Columnar view: `ds, yhat, yhat_lower, yhat_upper, trend, seasonal`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        points_to_dataframe(&self.points)
    }
}

/// Columnar view of forecast rows
pub fn points_to_dataframe(points: &[ForecastPoint]) -> Result<DataFrame> {
    let days: Vec<i32> = points
        .iter()
        .map(|p| days_since_epoch(p.date))
        .collect();
    let ds = Series::new("ds", days).cast(&DataType::Date)?;

    let column = |name: &str, f: fn(&ForecastPoint) -> f64| {
        Series::new(name, points.iter().map(f).collect::<Vec<f64>>())
    };

    let df = DataFrame::new(vec![
        ds,
        column("yhat", |p| p.yhat),
        column("yhat_lower", |p| p.yhat_lower),
        column("yhat_upper", |p| p.yhat_upper),
        column("trend", |p| p.trend),
        column("seasonal", |p| p.seasonal),
    ])?;
    Ok(df)
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Predict values (with bounds) for arbitrary dates, given in ascending order
    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastResult>;

    /// Dates the model was trained on, ascending
    fn history_dates(&self) -> &[NaiveDate];

    /// History dates followed by `periods` daily dates after the last one
    fn make_future_dates(&self, periods: usize) -> Result<Vec<NaiveDate>> {
        extend_dates(self.history_dates(), periods)
    }

    /// Predict the whole history plus `periods` future days
    fn forecast(&self, periods: usize) -> Result<ForecastResult> {
        let dates = self.make_future_dates(periods)?;
        self.predict(&dates)
    }

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on a cleaned series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a cleaned series
    fn train(&self, data: &CleanedSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod additive;
pub mod seasonality;
