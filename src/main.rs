//! Terminal dashboard for daily stock price forecasts

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use stock_forecast::config::AppConfig;
use stock_forecast::models::additive::AdditiveModel;
use stock_forecast::pipeline::ForecastPipeline;
use stock_forecast::providers::csv::write_forecast_csv;
use stock_forecast::providers::{CsvPriceSource, NoProfile, PriceSource, ProfileSource, YahooFinance};
use stock_forecast::render::{render_run, TextRenderer};
use stock_forecast::request::{ForecastRequest, PriceField, MAX_HORIZON_DAYS, MIN_HORIZON_DAYS};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod session;

/// Log filter used when `RUST_LOG` is unset; covers the library and this binary
const DEFAULT_LOG_FILTER: &str = "stock_forecast=info";

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Stock ticker
    #[arg(long, default_value = "AAPL")]
    ticker: String,

    /// First day of history (YYYY-MM-DD)
    #[arg(long, default_value = "2022-01-01")]
    start: NaiveDate,

    /// Day after the last day of history (YYYY-MM-DD)
    #[arg(long, default_value = "2023-01-01")]
    end: NaiveDate,

    /// Days to forecast past the last observation
    #[arg(
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(MIN_HORIZON_DAYS as i64..=MAX_HORIZON_DAYS as i64)
    )]
    horizon: u32,

    /// Price field to forecast: Open, High, Low or Close
    #[arg(long, default_value = "Close")]
    field: PriceField,

    /// Read `<DIR>/<TICKER>.csv` instead of calling Yahoo Finance
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the full forecast table to a CSV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Keep reading commands from stdin after the first run
    #[arg(short, long)]
    interactive: bool,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let request = ForecastRequest::new(&cli.ticker, cli.start, cli.end, cli.field, cli.horizon)?;
    let model = AdditiveModel::new(config.model.clone())?;

    let (prices, profiles): (Box<dyn PriceSource>, Box<dyn ProfileSource>) = match &cli.data_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Reading prices from CSV files");
            (
                Box::new(CsvPriceSource::new(dir)) as Box<dyn PriceSource>,
                Box::new(NoProfile) as Box<dyn ProfileSource>,
            )
        }
        None => {
            let yahoo = YahooFinance::new(&config.data).context("Failed to build HTTP client")?;
            (
                Box::new(yahoo.clone()) as Box<dyn PriceSource>,
                Box::new(yahoo) as Box<dyn ProfileSource>,
            )
        }
    };
    let pipeline = ForecastPipeline::new(prices, profiles, model);

    let mut execute = |request: &ForecastRequest, out: &mut io::StdoutLock<'static>| -> Result<()> {
        let run = pipeline.run(request);

        let mut renderer = TextRenderer::new(&mut *out, config.display.clone());
        render_run(&mut renderer, &run)?;
        out.flush()?;

        if let (Some(path), Some(artifacts)) = (&cli.export, run.artifacts()) {
            write_forecast_csv(&artifacts.forecast, path)
                .with_context(|| format!("Failed to export forecast to {}", path.display()))?;
            info!(path = %path.display(), rows = artifacts.forecast.len(), "Exported forecast");
        }
        Ok(())
    };

    let mut out = io::stdout().lock();
    if cli.interactive {
        let stdin = io::stdin();
        session::run_session(stdin.lock(), &mut out, request, execute)?;
    } else {
        execute(&request, &mut out)?;
    }
    Ok(())
}
