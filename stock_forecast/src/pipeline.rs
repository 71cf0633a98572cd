//! The forecast pipeline: profile, prices, cleaning, fit, score
//!
//! Control flow is strictly linear. The profile fetch is best effort and
//! degrades to a warning; every other stage either hands its artifact to the
//! next one or halts the run with a [`PipelineError`].

use crate::data::{select_field, CleanedSeries, FieldSeries, RawSeries};
use crate::error::{PipelineError, PipelineWarning};
use crate::metrics::{self, AccuracyMetrics};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::providers::{CompanyProfile, PriceSource, ProfileSource};
use crate::request::{ForecastRequest, PriceField};
use std::fmt;
use tracing::{info, warn};

/// Stages of one run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    ProfileFetch,
    SeriesFetch,
    Clean,
    FitForecast,
    Score,
    Render,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::ProfileFetch => "profile fetch",
            PipelineStage::SeriesFetch => "series fetch",
            PipelineStage::Clean => "clean",
            PipelineStage::FitForecast => "fit and forecast",
            PipelineStage::Score => "score",
            PipelineStage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Everything a successful run produces
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastArtifacts {
    pub cleaned: CleanedSeries,
    pub forecast: ForecastResult,
    pub metrics: AccuracyMetrics,
}

/// Result of one pipeline run, ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub request: ForecastRequest,
    /// Company summary, when the metadata service answered
    pub profile: Option<CompanyProfile>,
    pub warnings: Vec<PipelineWarning>,
    /// Selected price column, available once the column check passed
    pub history: Option<FieldSeries>,
    pub outcome: Result<ForecastArtifacts, PipelineError>,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn artifacts(&self) -> Option<&ForecastArtifacts> {
        self.outcome.as_ref().ok()
    }

    /// Condition that halted the run, if any
    pub fn error(&self) -> Option<&PipelineError> {
        self.outcome.as_ref().err()
    }
}

/// Runs requests against a price source, a profile source and a model
#[derive(Debug, Clone)]
pub struct ForecastPipeline<S, P, M> {
    prices: S,
    profiles: P,
    model: M,
}

impl<S, P, M> ForecastPipeline<S, P, M>
where
    S: PriceSource,
    P: ProfileSource,
    M: ForecastModel,
{
    pub fn new(prices: S, profiles: P, model: M) -> Self {
        Self {
            prices,
            profiles,
            model,
        }
    }

    /// Best-effort company summary
    pub fn fetch_company_profile(&self, ticker: &str) -> Result<CompanyProfile, PipelineWarning> {
        self.profiles
            .fetch_info(ticker)
            .map(|info| CompanyProfile::from_info(&info))
            .map_err(|e| PipelineWarning::MetadataUnavailable(e.to_string()))
    }

    /// Daily history for the request's ticker and range; empty is a halt
    pub fn fetch_price_series(&self, request: &ForecastRequest) -> Result<RawSeries, PipelineError> {
        let raw = self
            .prices
            .fetch_prices(request.ticker(), request.start_date(), request.end_date())
            .map_err(|e| PipelineError::DataServiceFailure(e.to_string()))?;

        if raw.is_empty() {
            return Err(PipelineError::EmptySeries);
        }
        Ok(raw)
    }

    /// Selected column plus its cleaned form.
    ///
    /// The column is returned even when cleaning leaves nothing, so the
    /// historical view can still be shown.
    pub fn clean(
        &self,
        raw: &RawSeries,
        field: PriceField,
    ) -> Result<(FieldSeries, Result<CleanedSeries, PipelineError>), PipelineError> {
        let selected = select_field(raw, field)?;
        let cleaned = selected.clean();
        Ok((selected, cleaned))
    }

    /// Train on the cleaned series and predict the history plus `horizon_days`
    pub fn fit_and_forecast(
        &self,
        cleaned: &CleanedSeries,
        horizon_days: u32,
    ) -> Result<ForecastResult, PipelineError> {
        let failure = |e: crate::error::ForecastError| PipelineError::ForecastingFailure(e.to_string());
        let trained = self.model.train(cleaned).map_err(failure)?;
        trained.forecast(horizon_days as usize).map_err(failure)
    }

    /// In-sample accuracy of the forecast
    pub fn score_backtest(
        &self,
        cleaned: &CleanedSeries,
        forecast: &ForecastResult,
    ) -> Result<AccuracyMetrics, PipelineError> {
        metrics::score_backtest(cleaned, forecast)
            .map_err(|e| PipelineError::ForecastingFailure(e.to_string()))
    }

    /// Run every stage for one request
    pub fn run(&self, request: &ForecastRequest) -> PipelineRun {
        info!(%request, "Starting forecast run");

        info!(stage = %PipelineStage::ProfileFetch, "Entering stage");
        let mut warnings = Vec::new();
        let profile = match self.fetch_company_profile(request.ticker()) {
            Ok(profile) => Some(profile),
            Err(warning) => {
                warn!(detail = warning.detail(), "{}", warning);
                warnings.push(warning);
                None
            }
        };

        let mut history = None;
        let outcome = self.run_stages(request, &mut history);
        match &outcome {
            Ok(artifacts) => info!(
                rows = artifacts.forecast.len(),
                mae = artifacts.metrics.mae,
                rmse = artifacts.metrics.rmse,
                "Forecast run finished"
            ),
            Err(error) => warn!(%error, "Forecast run halted"),
        }

        PipelineRun {
            request: request.clone(),
            profile,
            warnings,
            history,
            outcome,
        }
    }

    fn run_stages(
        &self,
        request: &ForecastRequest,
        history: &mut Option<FieldSeries>,
    ) -> Result<ForecastArtifacts, PipelineError> {
        info!(stage = %PipelineStage::SeriesFetch, "Entering stage");
        let raw = self.fetch_price_series(request)?;
        info!(rows = raw.len(), "Fetched price series");

        info!(stage = %PipelineStage::Clean, field = %request.price_field(), "Entering stage");
        let (selected, cleaned) = self.clean(&raw, request.price_field())?;
        *history = Some(selected);
        let cleaned = cleaned?;
        info!(rows = cleaned.len(), dropped = raw.len().saturating_sub(cleaned.len()), "Cleaned series");

        info!(stage = %PipelineStage::FitForecast, model = self.model.name(), "Entering stage");
        let forecast = self.fit_and_forecast(&cleaned, request.horizon_days())?;

        info!(stage = %PipelineStage::Score, "Entering stage");
        let metrics = self.score_backtest(&cleaned, &forecast)?;

        Ok(ForecastArtifacts {
            cleaned,
            forecast,
            metrics,
        })
    }
}
