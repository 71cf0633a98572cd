mod common;

use approx::assert_relative_eq;
use chrono::Days;
use common::*;
use stock_forecast::config::{ModelConfig, SeasonalityMode};
use stock_forecast::data::CleanedSeries;
use stock_forecast::models::additive::AdditiveModel;
use stock_forecast::models::{ForecastModel, TrainedForecastModel};

#[test]
fn test_forecast_covers_history_and_horizon() {
    let cleaned = cleaned_trading_year();
    let trained = fast_model().train(&cleaned).unwrap();
    let forecast = trained.forecast(30).unwrap();

    assert_eq!(forecast.len(), 282);
    assert_eq!(forecast.horizon(), 30);
    assert_eq!(trained.history_dates(), cleaned.dates().as_slice());

    let last = cleaned.last_date().unwrap();
    for (i, point) in forecast.future().iter().enumerate() {
        assert_eq!(point.date, last.checked_add_days(Days::new(i as u64 + 1)).unwrap());
    }
    for point in forecast.points() {
        assert!(point.yhat_lower <= point.yhat_upper);
        assert!(point.yhat.is_finite());
    }
}

#[test]
fn test_make_future_dates() {
    let cleaned = cleaned_trading_year();
    let trained = fast_model().train(&cleaned).unwrap();
    let dates = trained.make_future_dates(3).unwrap();

    assert_eq!(dates.len(), 255);
    assert_eq!(dates[251], date("2022-12-20"));
    assert_eq!(dates[252], date("2022-12-21"));
    assert_eq!(dates[254], date("2022-12-23"));
}

#[test]
fn test_predict_arbitrary_dates() {
    let cleaned = cleaned_trading_year();
    let trained = fast_model().train(&cleaned).unwrap();

    let dates = vec![date("2022-06-01"), date("2023-02-01")];
    let result = trained.predict(&dates).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.history_len(), 1);
    assert!(result.get(date("2023-02-01")).is_some());

    let unordered = vec![date("2023-02-01"), date("2022-06-01")];
    assert!(trained.predict(&unordered).is_err());
}

#[test]
fn test_yearly_seasonality_needs_two_years() {
    let cleaned = cleaned_trading_year();
    let trained = fast_model().train(&cleaned).unwrap();
    assert_eq!(trained.seasonality_names(), vec!["weekly"]);
    assert_eq!(trained.changepoint_count(), 25);

    let dates = weekdays(date("2019-01-01"), 600);
    let values = synthetic_closes(600);
    let long = CleanedSeries::from_parts(&dates, &values).unwrap();
    let trained = fast_model().train(&long).unwrap();
    assert_eq!(trained.seasonality_names(), vec!["weekly", "yearly"]);
}

#[test]
fn test_short_history_reduces_changepoints() {
    let dates = weekdays(date("2022-01-03"), 10);
    let values: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
    let cleaned = CleanedSeries::from_parts(&dates, &values).unwrap();

    let trained = fast_model().train(&cleaned).unwrap();
    // floor(10 * 0.8) - 1
    assert_eq!(trained.changepoint_count(), 7);
}

#[test]
fn test_two_points_are_enough() {
    let cleaned =
        CleanedSeries::from_parts(&[date("2022-01-03"), date("2022-01-04")], &[10.0, 12.0]).unwrap();
    let model = AdditiveModel::new(ModelConfig {
        uncertainty_samples: 0,
        ..ModelConfig::default()
    })
    .unwrap();
    let forecast = model.train(&cleaned).unwrap().forecast(1).unwrap();

    assert_eq!(forecast.len(), 3);
    assert_relative_eq!(forecast.points()[0].yhat, 10.0, epsilon = 1e-3);
    assert_relative_eq!(forecast.points()[1].yhat, 12.0, epsilon = 1e-3);
    assert_relative_eq!(forecast.points()[2].yhat, 14.0, epsilon = 1e-2);
}

#[test]
fn test_seed_changes_interval_not_fit() {
    let cleaned = cleaned_trading_year();
    let with_seed = |seed: u64| {
        AdditiveModel::new(ModelConfig {
            uncertainty_samples: 200,
            seed,
            weekly_seasonality: SeasonalityMode::Off,
            ..ModelConfig::default()
        })
        .unwrap()
        .train(&cleaned)
        .unwrap()
        .forecast(20)
        .unwrap()
    };

    let a = with_seed(1);
    let b = with_seed(2);
    assert_eq!(a.values(), b.values());
    assert_ne!(a, b);
}

#[test]
fn test_to_dataframe_columns() {
    let cleaned = cleaned_trading_year();
    let forecast = fast_model().train(&cleaned).unwrap().forecast(5).unwrap();
    let df = forecast.to_dataframe().unwrap();

    assert_eq!(
        df.get_column_names(),
        vec!["ds", "yhat", "yhat_lower", "yhat_upper", "trend", "seasonal"]
    );
    assert_eq!(df.height(), 257);
}
