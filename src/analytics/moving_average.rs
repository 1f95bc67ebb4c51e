use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::process::NormalizedSeries;

pub const DEFAULT_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AveragePoint {
    pub index: usize,
    pub date: DateTime<Utc>,
    pub average: f64,
}

/// Trailing moving average of series `name`.
///
/// Point `i` averages indices `max(0, i - window + 1) ..= i`, so the window
/// shrinks near the start instead of padding. A window of 0 acts as 1.
pub fn moving_average(
    series: &NormalizedSeries,
    name: &str,
    window: usize,
) -> Result<Vec<AveragePoint>> {
    let idx = series
        .series_index(name)
        .ok_or_else(|| AnalyticsError::SeriesNotFound(name.to_string()))?;
    let values = series.column_values(idx);

    Ok(trailing_means(&values, window)
        .into_iter()
        .zip(&series.rows)
        .enumerate()
        .map(|(index, (average, row))| AveragePoint {
            index,
            date: row.date,
            average,
        })
        .collect())
}

/// Trailing means; each point is summed from its own window slice.
pub fn trailing_means(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let slice = &values[(i + 1).saturating_sub(window)..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}
