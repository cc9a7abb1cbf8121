//! Tabular input at the engine boundary.
//!
//! External readers (CSV, Excel, HTTP uploads) hand the engine a
//! [`RawTable`] of string cells. Before any row is interpreted, the header is
//! validated against a [`ColumnSchema`]; every required column that is absent
//! is reported at once and the run stops. Rows that pass are coerced into
//! [`Measurement`]s, and rows that cannot be coerced are counted in
//! [`DropCounts`] rather than aborting the run.
//!
//! Column matching is exact after trimming header whitespace. There is no
//! case-folding or fuzzy matching, so a mislabelled column is a schema error
//! instead of a silent wrong match.

mod ingest;
mod schema;

pub use ingest::{ingest, DropCounts, Ingested, Measurement};
pub use schema::{ColumnSchema, ResolvedColumns};

use serde::{Deserialize, Serialize};

/// A header plus rows of string cells.
///
/// Rows may be shorter than the header; missing trailing cells read as
/// empty.
///
/// # Examples
///
/// ```
/// use u_throughput::table::RawTable;
///
/// let mut table = RawTable::new(["product_id", "model_id", "throughput"]);
/// table.push_row(["BOM-1", "WB3100-A", "812.5"]);
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.column_index("model_id"), Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers in order.
    pub columns: Vec<String>,
    /// Data rows, each a list of cells aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Creates an empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends one row of cells.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the column whose trimmed header equals `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Cell at `(row, column)`, or `""` when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_trims_header() {
        let table = RawTable::new([" product_id ", "model_id"]);
        assert_eq!(table.column_index("product_id"), Some(0));
        assert_eq!(table.column_index("PRODUCT_ID"), None);
    }

    #[test]
    fn short_rows_read_as_empty() {
        let mut table = RawTable::new(["a", "b", "c"]);
        table.push_row(["1"]);
        assert_eq!(table.cell(0, 0), "1");
        assert_eq!(table.cell(0, 2), "");
        assert_eq!(table.cell(5, 0), "");
    }

    #[test]
    fn empty_table() {
        let table = RawTable::new(["a"]);
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }
}
