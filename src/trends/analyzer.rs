use super::types::{LinearFit, TrendClassification, TrendDirection};
use crate::anomaly::bounds::{mean_of, scaled_values};
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::history::Series;

pub const DEFAULT_FORECAST_MIN_SAMPLES: usize = 5;

pub struct TrendAnalyzer {
    slope_threshold: f64,
    forecast_min_samples: usize,
}

impl TrendAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            slope_threshold: config.slope_threshold,
            forecast_min_samples: config.forecast_min_samples,
        }
    }

    pub fn classify(&self, series: &Series) -> Result<TrendClassification> {
        classify_trend(series, self.slope_threshold)
    }

    pub fn forecast(&self, series: &Series) -> Result<f64> {
        forecast_next_with(series, self.forecast_min_samples)
    }
}

/// Fits a line through `(index, value)` pairs, `x = 0..N-1`.
pub fn fit_line(series: &Series) -> Result<LinearFit> {
    let n = series.len();
    if n < 2 {
        return Err(Error::InsufficientData { required: 2, got: n });
    }

    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let (scale, ys) = scaled_values(series);
    let mean_y = mean_of(&ys);

    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - mean_x;
        numerator += dx * (y - mean_y);
        denominator += dx * dx;
    }

    // denominator > 0 whenever n >= 2
    let slope = numerator / denominator;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;

    for (i, y) in ys.iter().enumerate() {
        let y_pred = slope * i as f64 + intercept;
        ss_res += (y - y_pred).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }

    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let fit = LinearFit {
        slope: slope * scale,
        intercept: intercept * scale,
        r_squared,
        samples: n,
    };

    if !(fit.slope.is_finite() && fit.intercept.is_finite()) {
        return Err(Error::invalid(
            "series",
            format!("fitted line of '{}' exceeds the f64 range", series.variable()),
        ));
    }

    Ok(fit)
}

/// Labels the series rising, falling or stable. A slope exactly at
/// `±slope_threshold` is stable.
pub fn classify_trend(series: &Series, slope_threshold: f64) -> Result<TrendClassification> {
    if !slope_threshold.is_finite() || slope_threshold < 0.0 {
        return Err(Error::invalid("slope_threshold", "must be a finite, non-negative number"));
    }

    let fit = fit_line(series)?;

    let direction = if fit.slope > slope_threshold {
        TrendDirection::Rising
    } else if fit.slope < -slope_threshold {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    };

    log::debug!(
        "{}: slope {:.4} (r² {:.2}) -> {}",
        series.variable(),
        fit.slope,
        fit.r_squared,
        direction
    );

    Ok(TrendClassification { direction, fit })
}

/// Value of the fitted line one step past the last reading, requiring
/// at least five readings.
pub fn forecast_next(series: &Series) -> Result<f64> {
    forecast_next_with(series, DEFAULT_FORECAST_MIN_SAMPLES)
}

pub fn forecast_next_with(series: &Series, min_samples: usize) -> Result<f64> {
    if min_samples < 2 {
        return Err(Error::invalid("forecast_min_samples", "a line needs at least 2 samples"));
    }
    if series.len() < min_samples {
        return Err(Error::InsufficientData {
            required: min_samples,
            got: series.len(),
        });
    }

    let fit = fit_line(series)?;
    let predicted = fit.predict(series.len() as f64);
    if !predicted.is_finite() {
        return Err(Error::invalid(
            "series",
            format!("forecast of '{}' exceeds the f64 range", series.variable()),
        ));
    }
    Ok(predicted)
}
