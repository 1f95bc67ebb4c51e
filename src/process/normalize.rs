use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::process::{date_parser::parse_date, raw_table::RawTable, utils::coerce_number};

/// One dated observation; `values` is aligned with
/// [`NormalizedSeries::series_columns`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub date: DateTime<Utc>,
    pub values: Vec<f64>,
}

/// Date-indexed, numerically typed view of a [`RawTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSeries {
    pub date_column: String,
    pub series_columns: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl NormalizedSeries {
    /// Position of `name` among the series columns.
    pub fn series_index(&self, name: &str) -> Option<usize> {
        self.series_columns.iter().position(|c| c == name)
    }

    /// All values of series column `idx`, in row order.
    pub fn column_values(&self, idx: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row.values[idx]).collect()
    }

    /// All values of the series called `name`, if it exists.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        self.series_index(name).map(|idx| self.column_values(idx))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Turn raw rows into a [`NormalizedSeries`].
///
/// The first header is the date column and the rest are series columns.
/// Rows whose date does not parse are dropped; series cells that are
/// absent or non-numeric become 0. Returns `None` for a table with no rows
/// or no columns.
pub fn normalize(table: &RawTable) -> Option<NormalizedSeries> {
    if table.is_empty() {
        return None;
    }
    let (date_column, series_columns) = table.headers.split_first()?;

    let mut rows = Vec::with_capacity(table.row_count());
    let mut defaulted = 0usize;
    for (idx, raw) in table.rows.iter().enumerate() {
        let Some(date) = raw.first().and_then(|v| parse_date(v)) else {
            debug!(row = idx, value = ?raw.first(), "dropping row with unparsable date");
            continue;
        };

        let values = (1..=series_columns.len())
            .map(|col| {
                let coerced = coerce_number(raw.get(col).map(String::as_str));
                if coerced.is_default() {
                    defaulted += 1;
                }
                coerced.value()
            })
            .collect();
        rows.push(SeriesRow { date, values });
    }

    debug!(
        kept = rows.len(),
        dropped = table.row_count() - rows.len(),
        defaulted,
        "normalized table"
    );

    Some(NormalizedSeries {
        date_column: date_column.clone(),
        series_columns: series_columns.to_vec(),
        rows,
    })
}
