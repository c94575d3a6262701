//! # Table Model
//!
//! In-memory representation of an uploaded file: ordered, uniquely named columns of
//! equal length, each holding numbers or text plus explicit missing markers.
mod cell;
mod column;

pub use cell::CellValue;
pub use column::Column;
pub use column::ColumnType;

use std::collections::HashSet;
use thiserror::Error;

/// Errors raised when columns do not form a valid table.
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// Ordered sequence of named columns sharing one row count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Creates a table, checking that column names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut names = HashSet::<&str>::new();
        for column in &columns {
            if !names.insert(column.name()) {
                Err(TableError::DuplicateColumn(column.name().to_owned()))?;
            }
        }
        if let Some(expected) = columns.first().map(Column::len) {
            if let Some(column) = columns.iter().find(|column| column.len() != expected) {
                Err(TableError::LengthMismatch {
                    column: column.name().to_owned(),
                    expected,
                    found: column.len(),
                })?;
            }
        }
        Ok(Table { columns })
    }

    /// Wraps columns already known to satisfy the table invariants.
    pub(crate) fn from_columns(columns: Vec<Column>) -> Self {
        Table { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// Column names in display order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows; zero for a table without columns.
    pub fn row_count(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Returns the cells of one row in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index < self.row_count() {
            Some(self.columns.iter().map(|column| &column.cells[index]).collect())
        } else {
            None
        }
    }

    /// Iterates over rows in order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.row_count()).map(|index| self.columns.iter().map(|column| &column.cells[index]).collect())
    }

    /// Returns a table holding only the first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.to_owned(),
                kind: column.kind,
                cells: column.cells.iter().take(n).cloned().collect(),
            })
            .collect();
        Table { columns }
    }

    /// Renders the first `n` rows as an aligned text grid.
    pub fn preview(&self, n: usize) -> String {
        const MISSING: &str = "null";
        let head = self.head(n);
        let mut grid: Vec<Vec<String>> = vec![head.column_names().iter().map(|name| name.to_string()).collect()];
        for row in head.rows() {
            grid.push(
                row.iter()
                    .map(|cell| if cell.is_missing() { MISSING.to_owned() } else { cell.to_string() })
                    .collect(),
            );
        }

        let widths: Vec<usize> = (0..head.column_count())
            .map(|col| grid.iter().map(|record| record[col].chars().count()).max().unwrap_or(0))
            .collect();
        let mut output = String::new();
        for record in &grid {
            let line: Vec<String> = record
                .iter()
                .zip(&widths)
                .map(|(value, width)| format!("{value:<width$}"))
                .collect();
            output.push_str(line.join(" | ").trim_end());
            output.push('\n');
        }
        if self.row_count() > n {
            output.push_str(&format!("... {} more rows\n", self.row_count() - n));
        }
        output
    }
}
