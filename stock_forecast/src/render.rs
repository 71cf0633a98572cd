//! Terminal rendering of pipeline runs

use crate::config::DisplayConfig;
use crate::data::{CleanedSeries, FieldSeries};
use crate::error::{PipelineError, Result};
use crate::metrics::AccuracyMetrics;
use crate::models::{points_to_dataframe, ForecastResult};
use crate::pipeline::{PipelineRun, PipelineStage};
use crate::providers::CompanyProfile;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

/// Page title
pub const TITLE: &str = "Stock Price Forecasting App";

/// Output surface for the artifacts of a run
pub trait Renderer {
    fn title(&mut self, title: &str) -> Result<()>;
    fn company_summary(&mut self, profile: &CompanyProfile) -> Result<()>;
    fn historical_chart(&mut self, history: &FieldSeries) -> Result<()>;
    fn forecast_chart(&mut self, cleaned: &CleanedSeries, forecast: &ForecastResult) -> Result<()>;
    fn forecast_table(&mut self, forecast: &ForecastResult) -> Result<()>;
    fn metrics(&mut self, metrics: &AccuracyMetrics) -> Result<()>;
    fn error_banner(&mut self, message: &str) -> Result<()>;
    fn warning_banner(&mut self, message: &str) -> Result<()>;
}

/// Drive a renderer through every artifact a run produced
pub fn render_run<R: Renderer + ?Sized>(renderer: &mut R, run: &PipelineRun) -> Result<()> {
    debug!(stage = %PipelineStage::Render, "Entering stage");
    renderer.title(TITLE)?;

    if let Some(profile) = &run.profile {
        renderer.company_summary(profile)?;
    }
    for warning in &run.warnings {
        renderer.warning_banner(&warning.to_string())?;
    }

    // The column check passed, so the history is shown even if a later stage halted
    if let Some(history) = &run.history {
        renderer.historical_chart(history)?;
    }

    match &run.outcome {
        Ok(artifacts) => {
            renderer.forecast_chart(&artifacts.cleaned, &artifacts.forecast)?;
            renderer.forecast_table(&artifacts.forecast)?;
            renderer.metrics(&artifacts.metrics)?;
        }
        Err(error) => renderer.error_banner(&banner_text(error))?,
    }
    Ok(())
}

/// Message shown for a halted run
pub fn banner_text(error: &PipelineError) -> String {
    error.to_string()
}

/// Plain-text renderer writing to any `Write`
pub struct TextRenderer<W: Write> {
    out: W,
    display: DisplayConfig,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, display: DisplayConfig) -> Self {
        Self { out, display }
    }

    /// Give back the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn subheader(&mut self, text: &str) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", text)?;
        writeln!(self.out, "{}", "-".repeat(text.chars().count()))?;
        Ok(())
    }

    fn write_chart(&mut self, chart: &Chart) -> Result<()> {
        for line in chart.lines() {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn title(&mut self, title: &str) -> Result<()> {
        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "{}", "=".repeat(title.chars().count()))?;
        Ok(())
    }

    fn company_summary(&mut self, profile: &CompanyProfile) -> Result<()> {
        self.subheader("Company Summary")?;
        writeln!(self.out, "{}", profile.name)?;
        writeln!(self.out, "Sector: {} | Industry: {}", profile.sector, profile.industry)?;
        writeln!(self.out, "{}", profile.summary)?;
        Ok(())
    }

    fn historical_chart(&mut self, history: &FieldSeries) -> Result<()> {
        self.subheader(&format!("Historical {} Prices", history.field()))?;
        let dates: Vec<NaiveDate> = history.points().iter().map(|(d, _)| *d).collect();
        let values: Vec<Option<f64>> = history.points().iter().map(|(_, v)| *v).collect();

        let mut chart = Chart::new(&self.display, &dates);
        chart.line(&values, '*');
        self.write_chart(&chart)
    }

    fn forecast_chart(&mut self, cleaned: &CleanedSeries, forecast: &ForecastResult) -> Result<()> {
        self.subheader("Forecasted Prices")?;
        let dates = forecast.dates();
        let observed: HashMap<NaiveDate, f64> = cleaned
            .observations()
            .iter()
            .map(|o| (o.date, o.value))
            .collect();
        let actual: Vec<Option<f64>> = dates.iter().map(|d| observed.get(d).copied()).collect();
        let lower: Vec<Option<f64>> = forecast.points().iter().map(|p| Some(p.yhat_lower)).collect();
        let upper: Vec<Option<f64>> = forecast.points().iter().map(|p| Some(p.yhat_upper)).collect();
        let yhat: Vec<Option<f64>> = forecast.points().iter().map(|p| Some(p.yhat)).collect();

        let mut chart = Chart::new(&self.display, &dates);
        chart.band(&lower, &upper, '.');
        chart.line(&yhat, '-');
        chart.line(&actual, '*');
        self.write_chart(&chart)?;
        writeln!(self.out, "* actual   - forecast   . uncertainty interval")?;
        Ok(())
    }

    fn forecast_table(&mut self, forecast: &ForecastResult) -> Result<()> {
        let rows = self.display.table_rows;
        self.subheader(&format!("Forecast Table (Last {} Days)", rows))?;
        let df = points_to_dataframe(forecast.tail(rows))?
            .select(["ds", "yhat", "yhat_lower", "yhat_upper"])?;
        writeln!(self.out, "{}", df)?;
        Ok(())
    }

    fn metrics(&mut self, metrics: &AccuracyMetrics) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Model Performance on Historical Data:")?;
        writeln!(self.out, "{}", metrics)?;
        Ok(())
    }

    fn error_banner(&mut self, message: &str) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "[ERROR] {}", message)?;
        Ok(())
    }

    fn warning_banner(&mut self, message: &str) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "[WARNING] {}", message)?;
        Ok(())
    }
}

/// Character grid for line charts over a shared date axis
struct Chart {
    width: usize,
    height: usize,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
    len: usize,
    /// Marks per column, drawn in insertion order
    layers: Vec<Layer>,
}

enum Layer {
    Line(Vec<Option<f64>>, char),
    Band(Vec<Option<f64>>, Vec<Option<f64>>, char),
}

impl Chart {
    fn new(display: &DisplayConfig, dates: &[NaiveDate]) -> Self {
        Self {
            width: display.chart_width.min(dates.len()).max(1),
            height: display.chart_height.max(2),
            first: dates.first().copied(),
            last: dates.last().copied(),
            len: dates.len(),
            layers: Vec::new(),
        }
    }

    fn line(&mut self, values: &[Option<f64>], mark: char) {
        self.layers
            .push(Layer::Line(bucket_means(values, self.width), mark));
    }

    fn band(&mut self, lower: &[Option<f64>], upper: &[Option<f64>], mark: char) {
        self.layers.push(Layer::Band(
            bucket_means(lower, self.width),
            bucket_means(upper, self.width),
            mark,
        ));
    }

    fn value_range(&self) -> Option<(f64, f64)> {
        let mut values: Vec<f64> = Vec::new();
        for layer in &self.layers {
            match layer {
                Layer::Line(v, _) => values.extend(v.iter().flatten()),
                Layer::Band(lo, hi, _) => {
                    values.extend(lo.iter().flatten());
                    values.extend(hi.iter().flatten());
                }
            }
        }
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    fn lines(&self) -> Vec<String> {
        let (min, max) = match self.value_range() {
            Some(range) if self.len > 0 => range,
            _ => return vec!["(no data)".to_string()],
        };

        let row_of = |v: f64| -> usize {
            if max > min {
                (((max - v) / (max - min)) * (self.height - 1) as f64).round() as usize
            } else {
                self.height / 2
            }
        };

        let mut grid = vec![vec![' '; self.width]; self.height];
        for layer in &self.layers {
            match layer {
                Layer::Line(values, mark) => {
                    for (col, v) in values.iter().enumerate() {
                        if let Some(v) = v {
                            grid[row_of(*v)][col] = *mark;
                        }
                    }
                }
                Layer::Band(lower, upper, mark) => {
                    for (col, (lo, hi)) in lower.iter().zip(upper).enumerate() {
                        if let (Some(lo), Some(hi)) = (lo, hi) {
                            for row in grid.iter_mut().take(row_of(*lo) + 1).skip(row_of(*hi)) {
                                row[col] = *mark;
                            }
                        }
                    }
                }
            }
        }

        let mut lines = Vec::with_capacity(self.height + 2);
        for (i, row) in grid.iter().enumerate() {
            let label = if i == 0 {
                format!("{:>10.2}", max)
            } else if i == self.height - 1 {
                format!("{:>10.2}", min)
            } else {
                " ".repeat(10)
            };
            lines.push(format!("{} |{}", label, row.iter().collect::<String>()));
        }
        lines.push(format!("{} +{}", " ".repeat(10), "-".repeat(self.width)));

        if let (Some(first), Some(last)) = (self.first, self.last) {
            let first = first.to_string();
            let last = last.to_string();
            let gap = (self.width + 1).saturating_sub(first.len() + last.len()).max(1);
            lines.push(format!("{}  {}{}{}", " ".repeat(10), first, " ".repeat(gap), last));
        }
        lines
    }
}

/// Average present values in `width` equal buckets; short inputs pass through
fn bucket_means(values: &[Option<f64>], width: usize) -> Vec<Option<f64>> {
    if values.len() <= width || width == 0 {
        return values.to_vec();
    }
    (0..width)
        .map(|col| {
            let start = col * values.len() / width;
            let end = ((col + 1) * values.len() / width).max(start + 1);
            let present: Vec<f64> = values[start..end].iter().flatten().copied().collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect()
}
