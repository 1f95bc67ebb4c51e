#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names, from the header row of the uploaded file, in file order.
    pub headers: Vec<String>,
    /// Each data row, as a Vec of Strings aligned with `headers`.
    /// Rows may be shorter than `headers`; trailing columns are then absent.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw value of column `col` in row `row`, if present.
    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Iterate a row as ordered `(column, value)` pairs.
    pub fn row_pairs(&self, row: usize) -> impl Iterator<Item = (&str, &str)> {
        let values = self.rows.get(row).map(Vec::as_slice).unwrap_or(&[]);
        self.headers
            .iter()
            .map(String::as_str)
            .zip(values.iter().map(String::as_str))
    }
}
