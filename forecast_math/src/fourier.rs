//! Fourier series features for periodic components

use std::f64::consts::PI;

/// Fourier terms `[sin(2πnt/P), cos(2πnt/P)]` for `n = 1..=order`.
///
/// `t` is expressed in the same unit as `period` (days for daily data).
/// The returned vector has `2 * order` entries, sine and cosine interleaved.
pub fn fourier_terms(t: f64, period: f64, order: usize) -> Vec<f64> {
    let mut terms = Vec::with_capacity(2 * order);
    for n in 1..=order {
        let angle = 2.0 * PI * n as f64 * t / period;
        terms.push(angle.sin());
        terms.push(angle.cos());
    }
    terms
}
