//! Daily prices from CSV exports on disk

use super::PriceSource;
use crate::data::RawSeries;
use crate::error::Result;
use crate::models::ForecastResult;
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<dir>/<TICKER>.csv`, one file per ticker.
///
/// Files may carry the grouped three-row header written by multi-ticker
/// exports. Rows may be in any order; repeated dates keep the row written
/// last. A missing file means the ticker is unknown and yields an empty
/// series.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file holding a ticker's history
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.to_uppercase()))
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch_prices(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<RawSeries> {
        let path = self.path_for(ticker);
        if !path.exists() {
            debug!(path = %path.display(), "No price file");
            return Ok(RawSeries::empty());
        }

        let df = CsvReader::from_path(&path)?
            .has_header(true)
            .infer_schema(None)
            .finish()?;
        if df.height() == 0 {
            return Ok(RawSeries::empty());
        }

        let raw = RawSeries::from_dataframe(df)?;
        filter_date_range(&raw, start, end)?.sorted_by_date()
    }
}

/// Rows dated in `[start, end)`; rows without a date are dropped
pub fn filter_date_range(raw: &RawSeries, start: NaiveDate, end: NaiveDate) -> Result<RawSeries> {
    if raw.is_empty() {
        return Ok(raw.clone());
    }
    let keep: Vec<bool> = raw
        .dates()?
        .into_iter()
        .map(|d| d.map_or(false, |d| d >= start && d < end))
        .collect();
    let mask = BooleanChunked::from_slice("in_range", &keep);
    RawSeries::from_dataframe(raw.dataframe().filter(&mask)?)
}

/// Write every forecast row to a CSV file
pub fn write_forecast_csv<P: AsRef<Path>>(forecast: &ForecastResult, path: P) -> Result<()> {
    let mut df = forecast.to_dataframe()?;
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
    Ok(())
}
