use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::process::{utils::round_to, NormalizedSeries};

/// Pearson coefficients for every ordered pair of series columns.
///
/// Serializes as a nested `{row: {col: coefficient}}` map in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` correlates `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

struct MatrixRow<'a> {
    columns: &'a [String],
    values: &'a [f64],
}

impl Serialize for MatrixRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (col, val) in self.columns.iter().zip(self.values) {
            map.serialize_entry(col, val)?;
        }
        map.end()
    }
}

impl Serialize for CorrelationMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (col, row) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(
                col,
                &MatrixRow {
                    columns: &self.columns,
                    values: row,
                },
            )?;
        }
        map.end()
    }
}

/// Correlate every series column with every other one (self-pairs included),
/// rounding each coefficient to 4 decimals.
pub fn correlation_matrix(series: &NormalizedSeries) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = (0..series.series_columns.len())
        .map(|idx| series.column_values(idx))
        .collect();

    let values = columns
        .iter()
        .map(|x| {
            columns
                .iter()
                .map(|y| round_to(pearson(x, y), 4))
                .collect()
        })
        .collect();

    CorrelationMatrix {
        columns: series.series_columns.clone(),
        values,
    }
}

/// Population Pearson correlation of two equally long series.
///
/// Returns 0 when there are no points or either standard deviation is
/// exactly 0. That is a compatibility fallback, not the mathematical value,
/// which is undefined there.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let std_x = (var_x / n as f64).sqrt();
    let std_y = (var_y / n as f64).sqrt();
    if std_x == 0.0 || std_y == 0.0 {
        return 0.0;
    }
    (cov / n as f64) / (std_x * std_y)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
