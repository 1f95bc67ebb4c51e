use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::process::NormalizedSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTotal {
    pub name: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsReport {
    pub top_series: String,
    pub total: f64,
    /// Every series, largest total first.
    pub totals: Vec<SeriesTotal>,
}

/// Sum every series column and rank them by descending total.
///
/// The sort is stable, so equal totals keep column order and the earliest
/// column wins a tie for the top spot. A sum of `-0.0` counts as `0.0`.
pub fn series_totals(series: &NormalizedSeries) -> Result<TotalsReport> {
    let mut totals: Vec<SeriesTotal> = series
        .series_columns
        .iter()
        .enumerate()
        .map(|(idx, name)| SeriesTotal {
            name: name.clone(),
            total: series.rows.iter().map(|row| row.values[idx]).sum::<f64>() + 0.0,
        })
        .collect();
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));

    let top = totals
        .first()
        .cloned()
        .ok_or_else(|| AnalyticsError::SeriesNotFound("no series columns".to_string()))?;

    Ok(TotalsReport {
        top_series: top.name,
        total: top.total,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SeriesRow;
    use chrono::{TimeZone, Utc};

    fn series(columns: &[&str], rows: &[&[f64]]) -> NormalizedSeries {
        NormalizedSeries {
            date_column: "date".into(),
            series_columns: columns.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesRow {
                    date: Utc.with_ymd_and_hms(2024, 1, i as u32 + 1, 0, 0, 0).unwrap(),
                    values: v.to_vec(),
                })
                .collect(),
        }
    }

    #[test]
    fn picks_largest_total() {
        let s = series(&["A", "B"], &[&[10.0, 5.0], &[20.0, 15.0], &[30.0, 10.0]]);
        let report = series_totals(&s).unwrap();
        assert_eq!(report.top_series, "A");
        assert_eq!(report.total, 60.0);
        assert_eq!(report.totals[1].name, "B");
        assert_eq!(report.totals[1].total, 30.0);
    }

    #[test]
    fn ties_keep_column_order() {
        let s = series(&["x", "y", "z"], &[&[1.0, 3.0, 3.0], &[1.0, 0.0, 0.0]]);
        let report = series_totals(&s).unwrap();
        assert_eq!(report.top_series, "y");
        let names: Vec<_> = report.totals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["y", "z", "x"]);
    }

    #[test]
    fn full_tie_goes_to_first_column() {
        let s = series(&["x", "y", "z"], &[&[1.0, 3.0, 3.0], &[2.0, 0.0, 0.0]]);
        let report = series_totals(&s).unwrap();
        assert_eq!(report.top_series, "x");
        assert_eq!(report.total, 3.0);
        let names: Vec<_> = report.totals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn negative_zero_ties_with_zero() {
        let s = series(&["neg", "pos"], &[&[-0.0, 0.0], &[-0.0, 0.0]]);
        let report = series_totals(&s).unwrap();
        assert_eq!(report.top_series, "neg");
        assert!(report.total.is_sign_positive());
    }

    #[test]
    fn no_rows_totals_are_zero() {
        let s = series(&["a", "b"], &[]);
        let report = series_totals(&s).unwrap();
        assert_eq!(report.top_series, "a");
        assert_eq!(report.total, 0.0);
    }

    #[test]
    fn no_series_columns_is_not_found() {
        let s = series(&[], &[&[], &[]]);
        assert!(matches!(
            series_totals(&s),
            Err(AnalyticsError::SeriesNotFound(_))
        ));
    }
}
