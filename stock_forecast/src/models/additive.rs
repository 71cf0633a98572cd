//! Additive trend + seasonality model
//!
//! The fitted curve is `trend(t) + Σ seasonal(day)` where the trend is
//! piecewise linear with hinge changepoints and each seasonal component is a
//! Fourier series. Coefficients come from a single penalised least squares
//! solve on scaled data. Bounds are quantiles of simulated paths that add
//! random future changepoints and observation noise to `yhat`.

use super::seasonality::{resolve_seasonalities, Seasonality};
use super::{ForecastModel, ForecastPoint, ForecastResult, TrainedForecastModel};
use crate::config::ModelConfig;
use crate::data::{days_since_epoch, CleanedSeries, Observation};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use forecast_math::linalg::{mat_vec, ridge_least_squares};
use forecast_math::stats::{linspace_indices, max_abs, mean_abs, std_dev};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use statrs::statistics::{Data, OrderStatistics};
use tracing::debug;

/// Assumed residual variance on the scaled data, turning prior scales into penalties
const NOISE_VARIANCE_PRIOR: f64 = 1e-3;
/// Penalty on the offset and base slope
const BASE_PENALTY: f64 = 1e-8;

/// Additive forecasting model
#[derive(Debug, Clone)]
pub struct AdditiveModel {
    name: String,
    config: ModelConfig,
}

impl AdditiveModel {
    /// Create a model with the given hyper-parameters
    pub fn new(config: ModelConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        Ok(Self {
            name: "Additive (trend + seasonality)".to_string(),
            config,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl Default for AdditiveModel {
    fn default() -> Self {
        Self {
            name: "Additive (trend + seasonality)".to_string(),
            config: ModelConfig::default(),
        }
    }
}

/// Maps a date to its design row
#[derive(Debug, Clone)]
struct FeatureSpec {
    first_day: f64,
    span_days: f64,
    /// Changepoint locations in scaled time
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
}

impl FeatureSpec {
    fn scaled_time(&self, day: f64) -> f64 {
        (day - self.first_day) / self.span_days
    }

    /// Offset, slope and changepoint columns
    fn trend_width(&self) -> usize {
        2 + self.changepoints.len()
    }

    fn width(&self) -> usize {
        self.trend_width() + self.seasonalities.iter().map(|s| s.width()).sum::<usize>()
    }

    fn row(&self, day: f64) -> Vec<f64> {
        let t = self.scaled_time(day);
        let mut row = Vec::with_capacity(self.width());
        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|&s| (t - s).max(0.0)));
        for seasonality in &self.seasonalities {
            row.extend(seasonality.features(day));
        }
        row
    }
}

/// Additive model fitted to one series
#[derive(Debug, Clone)]
pub struct TrainedAdditiveModel {
    name: String,
    config: ModelConfig,
    history: Vec<NaiveDate>,
    features: FeatureSpec,
    y_scale: f64,
    coefficients: Vec<f64>,
    /// Residual standard deviation in price units
    sigma: f64,
    /// Mean absolute changepoint rate change, in scaled units
    changepoint_scale: f64,
}

impl TrainedAdditiveModel {
    /// Number of trend changepoints in the fit
    pub fn changepoint_count(&self) -> usize {
        self.features.changepoints.len()
    }

    /// Names of the fitted seasonal components
    pub fn seasonality_names(&self) -> Vec<&'static str> {
        self.features.seasonalities.iter().map(|s| s.name).collect()
    }

    /// Residual standard deviation of the fit
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Trend and seasonal parts of the fitted curve at a date
    fn components(&self, date: NaiveDate) -> (f64, f64) {
        let row = self.features.row(days_since_epoch(date) as f64);
        let split = self.features.trend_width();
        let dot = |range: std::ops::Range<usize>| -> f64 {
            row[range.clone()]
                .iter()
                .zip(&self.coefficients[range])
                .map(|(x, b)| x * b)
                .sum()
        };
        let trend = dot(0..split) * self.y_scale;
        let seasonal = dot(split..row.len()) * self.y_scale;
        (trend, seasonal)
    }

    /// Simulated values per date, `uncertainty_samples` paths each
    fn simulate(&self, dates: &[NaiveDate], yhat: &[f64]) -> Result<Vec<Vec<f64>>> {
        let samples = self.config.uncertainty_samples;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let noise = if self.sigma > 0.0 {
            Some(Normal::new(0.0, self.sigma).map_err(|e| {
                ForecastError::ForecastingError(format!("Invalid noise scale: {}", e))
            })?)
        } else {
            None
        };
        let jump = if self.changepoint_scale > 0.0 {
            Some(Exp::new(1.0 / self.changepoint_scale).map_err(|e| {
                ForecastError::ForecastingError(format!("Invalid changepoint scale: {}", e))
            })?)
        } else {
            None
        };
        let rate = self.features.changepoints.len() as f64;
        let times: Vec<f64> = dates
            .iter()
            .map(|d| self.features.scaled_time(days_since_epoch(*d) as f64))
            .collect();

        let mut draws = vec![Vec::with_capacity(samples); dates.len()];
        for _ in 0..samples {
            let mut slope_change = 0.0;
            let mut level_change = 0.0;
            let mut previous_t = 1.0_f64;

            for (i, &t) in times.iter().enumerate() {
                if t > 1.0 {
                    let dt = t - previous_t;
                    if let Some(jump) = &jump {
                        if rng.gen_bool((rate * dt).clamp(0.0, 1.0)) {
                            let magnitude = jump.sample(&mut rng);
                            let signed = if rng.gen_bool(0.5) {
                                magnitude
                            } else {
                                -magnitude
                            };
                            slope_change += signed;
                        }
                    }
                    level_change += slope_change * dt;
                    previous_t = t;
                }

                let mut value = yhat[i] + level_change * self.y_scale;
                if let Some(noise) = &noise {
                    value += noise.sample(&mut rng);
                }
                draws[i].push(value);
            }
        }
        Ok(draws)
    }
}

impl ForecastModel for AdditiveModel {
    type Trained = TrainedAdditiveModel;

    fn train(&self, data: &CleanedSeries) -> Result<Self::Trained> {
        let mut observations: Vec<Observation> = data.observations().to_vec();
        if observations.len() < 2 {
            return Err(ForecastError::ForecastingError(format!(
                "Need at least 2 observations to fit, got {}",
                observations.len()
            )));
        }
        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(ForecastError::ForecastingError(format!(
                "Non-finite value {} on {}",
                bad.value, bad.date
            )));
        }

        observations.sort_by_key(|o| o.date);
        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(ForecastError::ForecastingError(format!(
                "Duplicate date {} in training data",
                pair[0].date
            )));
        }

        let n = observations.len();
        let days: Vec<f64> = observations
            .iter()
            .map(|o| days_since_epoch(o.date) as f64)
            .collect();
        let first_day = days[0];
        let span_days = days[n - 1] - first_day;
        let min_spacing = days
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);

        let values: Vec<f64> = observations.iter().map(|o| o.value).collect();
        let y_scale = match max_abs(&values) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let scaled: Vec<f64> = values.iter().map(|v| v / y_scale).collect();

        // Changepoints sit on observation times within the leading part of the history
        let history_size = (n as f64 * self.config.changepoint_range).floor() as usize;
        let n_changepoints = self
            .config
            .n_changepoints
            .min(history_size.saturating_sub(1));
        let changepoints: Vec<f64> = if n_changepoints > 0 {
            linspace_indices(history_size - 1, n_changepoints + 1)
                .into_iter()
                .skip(1)
                .map(|i| (days[i] - first_day) / span_days)
                .collect()
        } else {
            Vec::new()
        };

        let features = FeatureSpec {
            first_day,
            span_days,
            changepoints,
            seasonalities: resolve_seasonalities(
                self.config.weekly_seasonality,
                self.config.yearly_seasonality,
                span_days,
                min_spacing,
            ),
        };

        let design: Vec<Vec<f64>> = days.iter().map(|&d| features.row(d)).collect();

        let mut penalty = vec![BASE_PENALTY; 2];
        let changepoint_penalty =
            NOISE_VARIANCE_PRIOR / self.config.changepoint_prior_scale.powi(2);
        penalty.extend(std::iter::repeat(changepoint_penalty).take(features.changepoints.len()));
        let seasonal_penalty = NOISE_VARIANCE_PRIOR / self.config.seasonality_prior_scale.powi(2);
        penalty.extend(
            std::iter::repeat(seasonal_penalty).take(features.width() - features.trend_width()),
        );

        let coefficients = ridge_least_squares(&design, &scaled, &penalty)?;

        let residuals: Vec<f64> = mat_vec(&design, &coefficients)
            .iter()
            .zip(&scaled)
            .map(|(fitted, y)| y - fitted)
            .collect();
        let sigma = std_dev(&residuals, 0)? * y_scale;

        let deltas = &coefficients[2..features.trend_width()];
        let changepoint_scale = if deltas.is_empty() {
            0.0
        } else {
            mean_abs(deltas)?
        };

        debug!(
            observations = n,
            changepoints = features.changepoints.len(),
            seasonalities = ?features.seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            sigma,
            "Fitted additive model"
        );

        Ok(TrainedAdditiveModel {
            name: self.name.clone(),
            config: self.config.clone(),
            history: observations.iter().map(|o| o.date).collect(),
            features,
            y_scale,
            coefficients,
            sigma,
            changepoint_scale,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedForecastModel for TrainedAdditiveModel {
    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastResult> {
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ForecastError::ValidationError(format!(
                "Prediction dates must be strictly increasing, got {} then {}",
                pair[0], pair[1]
            )));
        }

        let components: Vec<(f64, f64)> = dates.iter().map(|&d| self.components(d)).collect();
        let yhat: Vec<f64> = components.iter().map(|(t, s)| t + s).collect();

        let (lower, upper) = if self.config.uncertainty_samples == 0 {
            (yhat.clone(), yhat.clone())
        } else {
            let low_q = (1.0 - self.config.interval_width) / 2.0;
            let high_q = (1.0 + self.config.interval_width) / 2.0;
            self.simulate(dates, &yhat)?
                .into_iter()
                .map(|draws| {
                    let mut data = Data::new(draws);
                    (data.quantile(low_q), data.quantile(high_q))
                })
                .unzip()
        };

        let last_history = self.history.last().copied();
        let history_len = dates
            .iter()
            .take_while(|&&d| last_history.map_or(false, |last| d <= last))
            .count();

        let points = dates
            .iter()
            .enumerate()
            .map(|(i, &date)| ForecastPoint {
                date,
                yhat: yhat[i],
                yhat_lower: lower[i].min(upper[i]),
                yhat_upper: upper[i].max(lower[i]),
                trend: components[i].0,
                seasonal: components[i].1,
            })
            .collect();

        ForecastResult::new(points, history_len)
    }

    fn history_dates(&self) -> &[NaiveDate] {
        &self.history
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeasonalityMode;
    use approx::assert_relative_eq;
    use chrono::Days;

    fn series(n: usize, f: impl Fn(usize) -> f64) -> CleanedSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let dates: Vec<NaiveDate> = (0..n)
            .map(|i| start.checked_add_days(Days::new(i as u64)).unwrap())
            .collect();
        let values: Vec<f64> = (0..n).map(f).collect();
        CleanedSeries::from_parts(&dates, &values).unwrap()
    }

    fn quiet_config() -> ModelConfig {
        ModelConfig {
            uncertainty_samples: 0,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_linear_series_is_recovered() {
        let data = series(60, |i| 100.0 + 0.5 * i as f64);
        let model = AdditiveModel::new(ModelConfig {
            weekly_seasonality: SeasonalityMode::Off,
            ..quiet_config()
        })
        .unwrap();
        let trained = model.train(&data).unwrap();
        let forecast = trained.forecast(5).unwrap();

        assert_eq!(forecast.len(), 65);
        assert_eq!(forecast.history_len(), 60);
        for (point, obs) in forecast.history().iter().zip(data.observations()) {
            assert_relative_eq!(point.yhat, obs.value, epsilon = 0.05);
        }
        assert_relative_eq!(forecast.points()[64].yhat, 100.0 + 0.5 * 64.0, epsilon = 0.5);
    }

    #[test]
    fn test_components_sum_to_yhat() {
        let data = series(90, |i| 50.0 + (i % 7) as f64);
        let trained = AdditiveModel::new(quiet_config()).unwrap().train(&data).unwrap();
        assert_eq!(trained.seasonality_names(), vec!["weekly"]);

        let forecast = trained.forecast(14).unwrap();
        for p in forecast.points() {
            assert_relative_eq!(p.trend + p.seasonal, p.yhat, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zero_samples_collapse_bounds() {
        let data = series(30, |i| 10.0 + (i as f64).sin());
        let trained = AdditiveModel::new(quiet_config()).unwrap().train(&data).unwrap();
        for p in trained.forecast(3).unwrap().points() {
            assert_eq!(p.yhat_lower, p.yhat);
            assert_eq!(p.yhat_upper, p.yhat);
        }
    }

    #[test]
    fn test_interval_covers_most_history() {
        let data = series(120, |i| 20.0 + 0.1 * i as f64 + ((i * 7919) % 13) as f64 * 0.2);
        let trained = AdditiveModel::default().train(&data).unwrap();
        assert!(trained.sigma() > 0.0);
        let forecast = trained.forecast(60).unwrap();

        let covered = forecast
            .history()
            .iter()
            .zip(data.observations())
            .filter(|(p, obs)| p.yhat_lower <= obs.value && obs.value <= p.yhat_upper)
            .count();
        let coverage = covered as f64 / data.len() as f64;
        assert!(coverage > 0.6 && coverage < 0.97, "coverage {}", coverage);

        for p in forecast.points() {
            assert!(p.yhat_lower <= p.yhat_upper);
        }
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let data = series(80, |i| 5.0 + ((i * 31) % 11) as f64);
        let model = AdditiveModel::default();
        let a = model.train(&data).unwrap().forecast(10).unwrap();
        let b = model.train(&data).unwrap().forecast(10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_short_and_duplicate_input() {
        let model = AdditiveModel::default();
        assert!(model.train(&series(1, |_| 1.0)).is_err());

        let d = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let dup = CleanedSeries::from_parts(&[d, d], &[1.0, 2.0]).unwrap();
        assert!(matches!(
            model.train(&dup),
            Err(ForecastError::ForecastingError(_))
        ));
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let d1 = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2022, 1, 4).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
        let data = CleanedSeries::from_parts(&[d3, d1, d2], &[3.0, 1.0, 2.0]).unwrap();
        let trained = AdditiveModel::new(quiet_config()).unwrap().train(&data).unwrap();
        assert_eq!(trained.history_dates(), &[d1, d2, d3]);
    }

    #[test]
    fn test_constant_series() {
        let data = series(40, |_| 7.0);
        let trained = AdditiveModel::default().train(&data).unwrap();
        let forecast = trained.forecast(5).unwrap();
        for p in forecast.points() {
            assert_relative_eq!(p.yhat, 7.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ModelConfig {
            interval_width: 0.0,
            ..ModelConfig::default()
        };
        assert!(matches!(
            AdditiveModel::new(config),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
