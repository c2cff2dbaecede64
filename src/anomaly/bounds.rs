use crate::error::{Error, Result};
use crate::history::Series;

pub const DEFAULT_SIGMA_MULTIPLIER: f64 = 2.0;

/// Normal range of a series: `mean ± k·std_dev`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub mean: f64,
    pub std_dev: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub latest: f64,
}

pub fn summarize(series: &Series) -> Result<Summary> {
    let latest = series
        .latest()
        .map(|r| r.value())
        .ok_or(Error::InsufficientData { required: 1, got: 0 })?;

    let (min, max) = series
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let (scale, scaled) = scaled_values(series);

    Ok(Summary {
        count: series.len(),
        mean: mean_of(&scaled) * scale,
        min,
        max,
        latest,
    })
}

/// Bounds at two standard deviations.
pub fn compute_bounds(series: &Series) -> Result<Bounds> {
    compute_bounds_with(series, DEFAULT_SIGMA_MULTIPLIER)
}

/// Bounds at `sigmas` sample standard deviations around the mean.
///
/// A single reading has no spread, so its bounds collapse onto its value.
pub fn compute_bounds_with(series: &Series, sigmas: f64) -> Result<Bounds> {
    if !sigmas.is_finite() || sigmas <= 0.0 {
        return Err(Error::invalid("sigma_multiplier", "must be a finite, positive number"));
    }
    if series.is_empty() {
        return Err(Error::InsufficientData { required: 1, got: 0 });
    }

    let (scale, scaled) = scaled_values(series);
    let mean = mean_of(&scaled);
    let std_dev = sample_std_dev(&scaled, mean);

    let bounds = Bounds {
        mean: mean * scale,
        std_dev: std_dev * scale,
        lower: (mean - sigmas * std_dev) * scale,
        upper: (mean + sigmas * std_dev) * scale,
    };

    if !(bounds.lower.is_finite() && bounds.upper.is_finite() && bounds.std_dev.is_finite()) {
        return Err(Error::invalid(
            "series",
            format!("bounds of '{}' exceed the f64 range", series.variable()),
        ));
    }

    Ok(bounds)
}

/// Values divided by a power of two that brings the largest magnitude into
/// `[1, 2)`. The division is exact, so statistics computed on the scaled
/// values and multiplied back match the unscaled ones without overflowing.
pub(crate) fn scaled_values(series: &Series) -> (f64, Vec<f64>) {
    let max_abs = series.values().fold(0.0f64, |m, v| m.max(v.abs()));
    if max_abs == 0.0 {
        return (1.0, series.values().collect());
    }

    let exponent = (max_abs.log2().floor() as i32).clamp(-1000, 1023);
    let scale = 2f64.powi(exponent);
    (scale, series.values().map(|v| v / scale).collect())
}

// Shifted by the last value so a constant series keeps its exact value.
pub(crate) fn mean_of(values: &[f64]) -> f64 {
    let shift = values.last().copied().unwrap_or(0.0);
    let n = values.len().max(1) as f64;
    shift + values.iter().map(|v| v - shift).sum::<f64>() / n
}

// N-1 denominator; zero for a single reading.
fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (n - 1) as f64).sqrt()
}
