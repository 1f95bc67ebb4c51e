use serde::Serialize;
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::process::{utils::round_to, NormalizedSeries};

pub const DEFAULT_PERIODS: usize = 3;
/// Longest projection a single forecast produces; larger requests are clamped.
pub const MAX_PERIODS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub slope: f64,
    pub intercept: f64,
    pub predictions: Vec<Prediction>,
}

/// Ordinary least squares fit of `y` against its zero-based index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit `values` against x = 0, 1, 2, ...
///
/// The x axis is the row position, not the row date, so forecasts assume
/// evenly spaced observations. With fewer than two points the x spread is
/// 0 and the slope falls back to 0; with no points the intercept is 0 too.
pub fn fit_linear(values: &[f64]) -> LinearFit {
    let n = values.len();
    if n == 0 {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
        };
    }

    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = values.iter().sum::<f64>() / n as f64;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }

    let slope = if den == 0.0 { 0.0 } else { num / den };
    LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    }
}

/// Project series `name` forward by `periods` rows.
///
/// Predictions sit at indices `n .. n + periods` where `n` is the number of
/// historical rows, with `periods` capped at [`MAX_PERIODS`]. Slope and
/// intercept are reported to 4 decimals and predictions to 2, all computed
/// from the unrounded fit.
pub fn forecast(series: &NormalizedSeries, name: &str, periods: usize) -> Result<Forecast> {
    let values = series
        .column(name)
        .ok_or_else(|| AnalyticsError::SeriesNotFound(name.to_string()))?;

    if periods > MAX_PERIODS {
        debug!(requested = periods, max = MAX_PERIODS, "clamping forecast length");
    }
    let periods = periods.min(MAX_PERIODS);

    let fit = fit_linear(&values);
    let n = values.len();
    let end = n.checked_add(periods).unwrap_or(usize::MAX);
    let predictions = (n..end)
        .map(|index| Prediction {
            index,
            value: round_to(fit.predict(index as f64), 2),
        })
        .collect();

    Ok(Forecast {
        slope: round_to(fit.slope, 4),
        intercept: round_to(fit.intercept, 4),
        predictions,
    })
}
