// src/process/mod.rs
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, trace};

use crate::error::{AnalyticsError, Result};

pub mod date_parser;
pub mod normalize;
pub mod raw_table;
pub mod utils;

pub use normalize::{normalize, NormalizedSeries, SeriesRow};
pub use raw_table::RawTable;

use utils::clean_str;

/// Open `csv_path` and stream it into a [`RawTable`]:
/// - The first record is the header row; names are trimmed and unquoted.
/// - Every following record becomes one row, in file order.
/// - Blank lines are skipped; rows with fewer fields than the header are kept.
///
/// A header-only (or completely empty) file yields a table with no rows.
#[tracing::instrument(level = "info", skip(csv_path), fields(path = %csv_path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(csv_path: P) -> Result<RawTable> {
    let file = File::open(&csv_path)?;
    load_csv_reader(file)
}

/// Same as [`load_csv`], reading from any byte source.
pub fn load_csv_reader<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // keep this so records with different field-counts work
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(clean_str).collect();
    let mut table = RawTable {
        headers,
        rows: Vec::new(),
    };

    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .map_err(|e| AnalyticsError::ParseFailure(format!("record {}: {}", idx, e)))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            trace!(idx, "skipping blank record");
            continue;
        }
        table.rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded csv"
    );
    Ok(table)
}
