//! Fourier seasonal components and the rules that switch them on

use crate::config::SeasonalityMode;
use forecast_math::fourier::fourier_terms;

/// Period of the weekly component, in days
pub const WEEKLY_PERIOD: f64 = 7.0;
/// Fourier order of the weekly component
pub const WEEKLY_ORDER: usize = 3;
/// Period of the yearly component, in days
pub const YEARLY_PERIOD: f64 = 365.25;
/// Fourier order of the yearly component
pub const YEARLY_ORDER: usize = 10;

/// One periodic component expressed as a Fourier series on the day number
#[derive(Debug, Clone, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    pub period: f64,
    pub order: usize,
}

impl Seasonality {
    pub fn weekly() -> Self {
        Self {
            name: "weekly",
            period: WEEKLY_PERIOD,
            order: WEEKLY_ORDER,
        }
    }

    pub fn yearly() -> Self {
        Self {
            name: "yearly",
            period: YEARLY_PERIOD,
            order: YEARLY_ORDER,
        }
    }

    /// Number of design columns
    pub fn width(&self) -> usize {
        2 * self.order
    }

    /// Feature values at a day number
    pub fn features(&self, day: f64) -> Vec<f64> {
        fourier_terms(day, self.period, self.order)
    }
}

/// Components to fit for a history.
///
/// `span_days` is the distance between the first and last date and
/// `min_spacing_days` the smallest gap between consecutive dates.
pub fn resolve_seasonalities(
    weekly: SeasonalityMode,
    yearly: SeasonalityMode,
    span_days: f64,
    min_spacing_days: f64,
) -> Vec<Seasonality> {
    let mut components = Vec::new();

    let use_yearly = match yearly {
        SeasonalityMode::On => true,
        SeasonalityMode::Off => false,
        SeasonalityMode::Auto => span_days >= 2.0 * YEARLY_PERIOD.floor(),
    };
    let use_weekly = match weekly {
        SeasonalityMode::On => true,
        SeasonalityMode::Off => false,
        SeasonalityMode::Auto => span_days >= 2.0 * WEEKLY_PERIOD && min_spacing_days < WEEKLY_PERIOD,
    };

    if use_weekly {
        components.push(Seasonality::weekly());
    }
    if use_yearly {
        components.push(Seasonality::yearly());
    }
    components
}
