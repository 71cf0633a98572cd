//! # Stock Forecast
//!
//! Fetch daily stock prices, fit an additive trend and seasonality model and
//! report the forecast with its in-sample accuracy.
//!
//! ## Features
//!
//! - Daily OHLCV retrieval from Yahoo Finance or from CSV exports on disk
//! - Best-effort company profile lookup
//! - Cleaning of the selected price field (Open, High, Low or Close)
//! - Piecewise linear trend with changepoints plus weekly and yearly Fourier seasonality
//! - Uncertainty intervals from seeded simulation
//! - MAE and RMSE on the historical fit
//! - Plain-text rendering of charts, the forecast table and metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stock_forecast::config::AppConfig;
//! use stock_forecast::models::additive::AdditiveModel;
//! use stock_forecast::pipeline::ForecastPipeline;
//! use stock_forecast::providers::YahooFinance;
//! use stock_forecast::render::{render_run, TextRenderer};
//! use stock_forecast::request::ForecastRequest;
//!
//! let config = AppConfig::default();
//! let yahoo = YahooFinance::new(&config.data)?;
//! let model = AdditiveModel::new(config.model.clone())?;
//! let pipeline = ForecastPipeline::new(yahoo.clone(), yahoo, model);
//!
//! let run = pipeline.run(&ForecastRequest::default());
//! let mut renderer = TextRenderer::new(std::io::stdout(), config.display.clone());
//! render_run(&mut renderer, &run)?;
//! # Ok::<(), stock_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod render;
pub mod request;
pub mod utils;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::data::{CleanedSeries, RawSeries};
pub use crate::error::{ForecastError, PipelineError, PipelineWarning};
pub use crate::metrics::AccuracyMetrics;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::pipeline::{ForecastPipeline, PipelineRun};
pub use crate::request::{ForecastRequest, PriceField};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
