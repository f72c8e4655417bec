//! Output writer traits and table types
//!
//! This module defines the tabular shape of the pipeline's output and the
//! trait implemented by table writers.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Output path {path} exists and is not a file")]
    NotAFile { path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// One output table: a name, a header and rows of equal width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// File stem the table is written under
    pub name: &'static str,

    /// Column names
    pub header: Vec<&'static str>,

    /// Row values, one `Vec` per row
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table
    pub fn new(name: &'static str, header: &[&'static str]) -> Self {
        Self {
            name,
            header: header.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; its width must match the header
    pub fn push_row(&mut self, row: Vec<String>) {
        debug_assert_eq!(
            row.len(),
            self.header.len(),
            "row width does not match header of table {}",
            self.name
        );
        self.rows.push(row);
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| *h == name)
    }
}

/// The complete output of one run
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Sub-directory of the output directory the tables belong in
    pub subdirectory: Option<&'static str>,

    /// Dimension tables first, fact tables last
    pub tables: Vec<Table>,
}

impl Dataset {
    /// Looks up a table by name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Trait for table writers
///
/// Writers receive finished tables only; nothing is written while the
/// pipeline is still accumulating rows.
pub trait TableWriter {
    /// Writes one table, replacing any previous table of the same name
    ///
    /// # Returns
    ///
    /// The location the table was written to
    fn write_table(&self, table: &Table) -> OutputResult<PathBuf>;

    /// Writes a set of tables that is committed together
    ///
    /// Either every table replaces its previous version or, on error, none
    /// is touched and no intermediate files remain.
    fn write_tables(&self, tables: &[Table]) -> OutputResult<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows_and_columns() {
        let mut table = Table::new("browsers", &["id", "name"]);
        assert!(table.is_empty());

        table.push_row(vec!["1".to_string(), "Chrome".to_string()]);

        assert_eq!(table.len(), 1);
        assert_eq!(table.column("name"), Some(1));
        assert_eq!(table.column("missing"), None);
    }

    #[test]
    fn test_dataset_lookup() {
        let dataset = Dataset {
            subdirectory: None,
            tables: vec![Table::new("facts", &["id"])],
        };
        assert!(dataset.table("facts").is_some());
        assert!(dataset.table("dimensions").is_none());
    }
}
