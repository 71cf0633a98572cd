//! Price series handling: raw provider frames and cleaned observations

use crate::error::{ForecastError, PipelineError, Result};
use crate::request::PriceField;
use chrono::{DateTime, Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the date column in every raw series
pub const DATE_COLUMN: &str = "Date";

/// Days between 0001-01-01 and 1970-01-01, the epoch of polars `Date` values
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Daily OHLCV frame as returned by a price provider
///
/// The frame always has a `Date` column of `DataType::Date` once built
/// through [`RawSeries::from_dataframe`]; the value columns are kept as the
/// provider delivered them and only coerced when a field is selected.
#[derive(Debug, Clone, Default)]
pub struct RawSeries {
    df: DataFrame,
}

impl RawSeries {
    /// A series with no rows and no columns
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalise a provider frame: flatten grouped headers and parse the date column
    pub fn from_dataframe(df: DataFrame) -> Result<Self> {
        if df.width() == 0 {
            return Ok(Self::empty());
        }

        let mut df = flatten_columns(df)?;

        let dates = {
            let column = df.column(DATE_COLUMN).map_err(|_| {
                ForecastError::DataError(format!(
                    "No '{}' column found in data. Columns: {:?}",
                    DATE_COLUMN,
                    df.get_column_names()
                ))
            })?;
            column_to_dates(column)?
        };

        let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(days_since_epoch)).collect();
        let date_series = Series::new(DATE_COLUMN, days).cast(&DataType::Date)?;
        df.with_column(date_series)?;

        Ok(Self { df })
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the series has no rows
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Column names in frame order
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Rows ascending by date; when a date repeats the last row wins
    pub fn sorted_by_date(&self) -> Result<Self> {
        if self.is_empty() {
            return Ok(self.clone());
        }
        let df = self.df.sort([DATE_COLUMN], false, true)?.unique_stable(
            Some(&[DATE_COLUMN.to_string()]),
            UniqueKeepStrategy::Last,
            None,
        )?;
        Ok(Self { df })
    }

    /// Parsed dates, `None` where a row has no valid date
    pub fn dates(&self) -> Result<Vec<Option<NaiveDate>>> {
        let column = self.df.column(DATE_COLUMN).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", DATE_COLUMN, e))
        })?;
        column_to_dates(column)
    }

    /// Column coerced to numbers; values that fail coercion become `None`
    pub fn numeric_column(&self, column_name: &str) -> Result<Vec<Option<f64>>> {
        let col = self.df.column(column_name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", column_name, e))
        })?;

        // Non-strict cast: unparseable strings turn into nulls
        let numeric = col.cast(&DataType::Float64)?;
        let values = numeric
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(values)
    }
}

/// One price field of a raw series, indexed by date
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    field: PriceField,
    points: Vec<(NaiveDate, Option<f64>)>,
}

impl FieldSeries {
    pub fn field(&self) -> PriceField {
        self.field
    }

    /// Rows with a valid date; the value is `None` where coercion failed
    pub fn points(&self) -> &[(NaiveDate, Option<f64>)] {
        &self.points
    }

    /// Drop missing values, failing if nothing remains
    pub fn clean(&self) -> std::result::Result<CleanedSeries, PipelineError> {
        let observations: Vec<Observation> = self
            .points
            .iter()
            .filter_map(|(date, value)| value.map(|value| Observation { date: *date, value }))
            .collect();

        if observations.is_empty() {
            return Err(PipelineError::EmptyAfterCleaning);
        }

        Ok(CleanedSeries { observations })
    }
}

/// Select the requested price field from a raw series.
///
/// Fails with [`PipelineError::MissingColumn`] when the field is not a
/// column of the frame.
pub fn select_field(
    raw: &RawSeries,
    field: PriceField,
) -> std::result::Result<FieldSeries, PipelineError> {
    let column = field.column_name();
    let available = raw.column_names();
    if !available.iter().any(|name| name == column) {
        return Err(PipelineError::MissingColumn {
            column: column.to_string(),
            available,
        });
    }

    let unreadable = |e: ForecastError| PipelineError::DataServiceFailure(e.to_string());
    let dates = raw.dates().map_err(unreadable)?;
    let values = raw.numeric_column(column).map_err(unreadable)?;

    let points = dates
        .into_iter()
        .zip(values)
        .filter_map(|(date, value)| date.map(|date| (date, value)))
        .collect();

    Ok(FieldSeries { field, points })
}

/// Select a price field and drop every row without a numeric value
pub fn clean_series(
    raw: &RawSeries,
    field: PriceField,
) -> std::result::Result<CleanedSeries, PipelineError> {
    select_field(raw, field)?.clean()
}

/// A dated numeric value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Dated, non-missing values ready for model fitting
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleanedSeries {
    observations: Vec<Observation>,
}

impl CleanedSeries {
    /// Build from observations, rejecting non-finite values
    pub fn new(observations: Vec<Observation>) -> Result<Self> {
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Non-finite value {} on {}",
                bad.value, bad.date
            )));
        }
        Ok(Self { observations })
    }

    /// Build from parallel date and value slices
    pub fn from_parts(dates: &[NaiveDate], values: &[f64]) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DataError(format!(
                "Got {} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        Self::new(
            dates
                .iter()
                .zip(values)
                .map(|(&date, &value)| Observation { date, value })
                .collect(),
        )
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Latest date in the series
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|o| o.date).max()
    }
}

/// Days since 1970-01-01
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`days_since_epoch`]
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Parse a date string as written by price providers.
///
/// Accepts `YYYY-MM-DD` optionally followed by a time part
/// (`2022-01-03 00:00:00-05:00`), and `MM/DD/YYYY`.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(prefix) = s.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

/// Convert a date-like column into calendar dates
fn column_to_dates(col: &Series) -> Result<Vec<Option<NaiveDate>>> {
    match col.dtype() {
        DataType::Date => {
            let days = col.cast(&DataType::Int32)?;
            Ok(days
                .i32()?
                .into_iter()
                .map(|d| d.and_then(date_from_epoch_days))
                .collect())
        }
        DataType::Datetime(unit, _) => {
            let per_second: i64 = match unit {
                TimeUnit::Nanoseconds => 1_000_000_000,
                TimeUnit::Microseconds => 1_000_000,
                TimeUnit::Milliseconds => 1_000,
            };
            let raw = col.cast(&DataType::Int64)?;
            Ok(raw
                .i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(|v| {
                        let secs = v.div_euclid(per_second);
                        let nanos = (v.rem_euclid(per_second) * (1_000_000_000 / per_second)) as u32;
                        DateTime::from_timestamp(secs, nanos).map(|dt| dt.date_naive())
                    })
                })
                .collect())
        }
        DataType::Utf8 => Ok(col
            .utf8()?
            .into_iter()
            .map(|v| v.and_then(parse_date_str))
            .collect()),
        other => Err(ForecastError::DataError(format!(
            "Column '{}' has type {} and cannot be read as dates",
            col.name(),
            other
        ))),
    }
}

/// Flatten per-ticker grouping into plain column names.
///
/// Handles the two shapes multi-ticker exports take once written to CSV:
/// the three-row header (`Price,Close,..` / `Ticker,AAPL,..` / `Date,,..`),
/// where the grouping rows end up as data, and tuple names such as
/// `('Close', 'AAPL')`.
pub fn flatten_columns(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for name in &names {
        if let Some(flat) = flatten_tuple_name(name) {
            df.rename(name, &flat)?;
        }
    }

    let first = match df.get_column_names().first() {
        Some(first) => first.to_string(),
        None => return Ok(df),
    };
    if first != "Price" {
        return Ok(df);
    }

    let keep: Vec<bool> = {
        let labels = df.column(&first)?.cast(&DataType::Utf8)?;
        let labels = labels.utf8()?;
        labels
            .into_iter()
            .map(|label| !matches!(label.map(str::trim), Some("Ticker") | Some("Date")))
            .collect()
    };
    let mask = BooleanChunked::from_slice("keep", &keep);
    let mut df = df.filter(&mask)?;
    df.rename(&first, DATE_COLUMN)?;

    Ok(df)
}

/// `('Close', 'AAPL')` -> `Close`
fn flatten_tuple_name(name: &str) -> Option<String> {
    let inner = name.trim().strip_prefix('(')?.strip_suffix(')')?;
    let first = inner.split(',').next()?.trim();
    let first = first.trim_matches(|c| c == '\'' || c == '"').trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_epoch_day_round_trip_anchor() {
        assert_eq!(days_since_epoch(date("1970-01-01")), 0);
        assert_eq!(days_since_epoch(date("1970-01-02")), 1);
        assert_eq!(date_from_epoch_days(19_000), Some(date("2022-01-08")));
    }

    #[test]
    fn test_parse_date_variants() {
        assert_eq!(parse_date_str("2022-01-03"), Some(date("2022-01-03")));
        assert_eq!(
            parse_date_str("2022-01-03 00:00:00-05:00"),
            Some(date("2022-01-03"))
        );
        assert_eq!(parse_date_str("01/03/2022"), Some(date("2022-01-03")));
        assert_eq!(parse_date_str("Ticker"), None);
        assert_eq!(parse_date_str(""), None);
    }

    #[test]
    fn test_flatten_tuple_name() {
        assert_eq!(flatten_tuple_name("('Close', 'AAPL')"), Some("Close".to_string()));
        assert_eq!(flatten_tuple_name("(\"Adj Close\", \"MSFT\")"), Some("Adj Close".to_string()));
        assert_eq!(flatten_tuple_name("Close"), None);
    }

    #[test]
    fn test_grouped_header_rows_are_dropped() {
        let df = DataFrame::new(vec![
            Series::new("Price", &["Ticker", "Date", "2022-01-03", "2022-01-04"]),
            Series::new("Close", &["AAPL", "", "182.01", "179.70"]),
        ])
        .unwrap();

        let raw = RawSeries::from_dataframe(df).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.column_names(), vec!["Date".to_string(), "Close".to_string()]);
        assert_eq!(
            raw.dates().unwrap(),
            vec![Some(date("2022-01-03")), Some(date("2022-01-04"))]
        );
        assert_eq!(
            raw.numeric_column("Close").unwrap(),
            vec![Some(182.01), Some(179.70)]
        );
    }

    #[test]
    fn test_missing_date_column() {
        let df = DataFrame::new(vec![Series::new("Close", &[1.0, 2.0])]).unwrap();
        assert!(matches!(
            RawSeries::from_dataframe(df),
            Err(ForecastError::DataError(_))
        ));
    }

    #[test]
    fn test_clean_drops_unparseable_values() {
        let df = DataFrame::new(vec![
            Series::new("Date", &["2022-01-03", "2022-01-04", "2022-01-05"]),
            Series::new("Close", &["10.5", "n/a", "11.0"]),
        ])
        .unwrap();
        let raw = RawSeries::from_dataframe(df).unwrap();

        let cleaned = clean_series(&raw, PriceField::Close).unwrap();
        assert_eq!(cleaned.values(), vec![10.5, 11.0]);
        assert_eq!(cleaned.dates(), vec![date("2022-01-03"), date("2022-01-05")]);
    }

    #[test]
    fn test_rows_without_dates_are_dropped() {
        let df = DataFrame::new(vec![
            Series::new("Date", &["2022-01-03", "garbage"]),
            Series::new("Open", &[1.0, 2.0]),
        ])
        .unwrap();
        let raw = RawSeries::from_dataframe(df).unwrap();

        let field = select_field(&raw, PriceField::Open).unwrap();
        assert_eq!(field.points(), &[(date("2022-01-03"), Some(1.0))]);
    }

    #[test]
    fn test_cleaned_series_rejects_nan() {
        let result = CleanedSeries::from_parts(&[date("2022-01-03")], &[f64::NAN]);
        assert!(result.is_err());
        assert!(CleanedSeries::from_parts(&[date("2022-01-03")], &[]).is_err());
    }
}
