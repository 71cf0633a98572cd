//! Application configuration loaded from TOML
//!
//! Every key is optional; a missing file section falls back to the defaults
//! below. Values are validated once after parsing so the rest of the crate
//! can trust them.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a config file when none is given explicitly
pub const CONFIG_ENV_VAR: &str = "STOCK_FORECAST_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub display: DisplayConfig,
}

/// Remote data service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Base URL of the daily chart endpoint
    pub chart_url: String,
    /// Base URL of the company profile endpoint
    pub profile_url: String,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            chart_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            profile_url: "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

/// Whether a seasonal component is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    /// Decide from the span and spacing of the history
    Auto,
    On,
    Off,
}

/// Additive model hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub weekly_seasonality: SeasonalityMode,
    pub yearly_seasonality: SeasonalityMode,
    pub interval_width: f64,
    pub uncertainty_samples: usize,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            weekly_seasonality: SeasonalityMode::Auto,
            yearly_seasonality: SeasonalityMode::Auto,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: 0,
        }
    }
}

impl ModelConfig {
    /// Reject values the model cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "changepoint_range must be in (0, 1], got {}",
                self.changepoint_range
            )));
        }
        if !(self.changepoint_prior_scale > 0.0 && self.changepoint_prior_scale.is_finite()) {
            return Err(ForecastError::ConfigError(format!(
                "changepoint_prior_scale must be positive, got {}",
                self.changepoint_prior_scale
            )));
        }
        if !(self.seasonality_prior_scale > 0.0 && self.seasonality_prior_scale.is_finite()) {
            return Err(ForecastError::ConfigError(format!(
                "seasonality_prior_scale must be positive, got {}",
                self.seasonality_prior_scale
            )));
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "interval_width must be in (0, 1), got {}",
                self.interval_width
            )));
        }
        Ok(())
    }
}

/// Terminal rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Rows shown in the forecast table
    pub table_rows: usize,
    /// Chart width in characters
    pub chart_width: usize,
    /// Chart height in lines
    pub chart_height: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            table_rows: 10,
            chart_width: 72,
            chart_height: 16,
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.table_rows == 0 || self.chart_width < 2 || self.chart_height < 2 {
            return Err(ForecastError::ConfigError(
                "table_rows must be positive and charts at least 2x2".to_string(),
            ));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&s)
    }

    /// Load from an explicit path, else from `STOCK_FORECAST_CONFIG`, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.display.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [model]
            yearly_seasonality = "off"
            uncertainty_samples = 0

            [display]
            table_rows = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.model.yearly_seasonality, SeasonalityMode::Off);
        assert_eq!(config.model.weekly_seasonality, SeasonalityMode::Auto);
        assert_eq!(config.model.uncertainty_samples, 0);
        assert_eq!(config.display.table_rows, 5);
        assert_eq!(config.display.chart_width, 72);
        assert_eq!(config.data, DataConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml_str("[model]\ninterval_width = 1.5").is_err());
        assert!(AppConfig::from_toml_str("[model]\nchangepoint_range = 0.0").is_err());
        assert!(AppConfig::from_toml_str("[display]\ntable_rows = 0").is_err());
        assert!(AppConfig::from_toml_str("[model]\nbogus = 1").is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[data]\nchart_url = \"http://localhost:9000/chart\"").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.data.chart_url, "http://localhost:9000/chart");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = AppConfig::from_path("/nonexistent/stock_forecast.toml");
        assert!(matches!(result, Err(ForecastError::ConfigError(_))));
    }
}
