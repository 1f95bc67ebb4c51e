//! Derived views over a normalized upload: totals, moving average,
//! correlation matrix and linear forecast.

use std::sync::Arc;
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::process::{normalize, NormalizedSeries};
use crate::store::DatasetStore;

pub mod correlation;
pub mod forecast;
pub mod moving_average;
pub mod totals;

pub use correlation::{correlation_matrix, pearson, CorrelationMatrix};
pub use forecast::{
    fit_linear, forecast, Forecast, LinearFit, Prediction, DEFAULT_PERIODS,
    MAX_PERIODS,
};
pub use moving_average::{moving_average, trailing_means, AveragePoint, DEFAULT_WINDOW};
pub use totals::{series_totals, SeriesTotal, TotalsReport};

/// Resolves datasets from the store and runs one analysis per call.
///
/// Nothing is cached between calls: every request normalizes the raw rows
/// again.
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<DatasetStore>,
}

impl AnalyticsEngine {
    pub fn new(store: Arc<DatasetStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    /// Normalized view of dataset `id`.
    ///
    /// Fails with [`AnalyticsError::InvalidDataset`] when the id is unknown
    /// or the upload had no data rows.
    pub async fn series(&self, id: &str) -> Result<NormalizedSeries> {
        let dataset = self
            .store
            .get(id)
            .await
            .ok_or_else(|| AnalyticsError::InvalidDataset(id.to_string()))?;

        let series = normalize(&dataset.table)
            .ok_or_else(|| AnalyticsError::InvalidDataset(id.to_string()))?;
        debug!(
            file_id = id,
            rows = series.len(),
            series = series.series_columns.len(),
            "normalized dataset"
        );
        Ok(series)
    }

    pub async fn totals(&self, id: &str) -> Result<TotalsReport> {
        series_totals(&self.series(id).await?)
    }

    pub async fn moving_average(
        &self,
        id: &str,
        name: &str,
        window: usize,
    ) -> Result<Vec<AveragePoint>> {
        moving_average(&self.series(id).await?, name, window)
    }

    pub async fn correlation(&self, id: &str) -> Result<CorrelationMatrix> {
        Ok(correlation_matrix(&self.series(id).await?))
    }

    pub async fn forecast(&self, id: &str, name: &str, periods: usize) -> Result<Forecast> {
        forecast(&self.series(id).await?, name, periods)
    }
}
