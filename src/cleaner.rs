//! # Table Cleaner
//!
//! Row deduplication and mean imputation. Both operations are pure and idempotent:
//! they return a new table and running them twice changes nothing further.
use crate::table::CellValue;
use crate::table::Column;
use crate::table::Table;
use std::collections::HashSet;

/// Hashable view of a cell used to compare whole rows.
#[derive(Hash, PartialEq, Eq)]
enum CellKey<'a> {
    Missing,
    Number(u64),
    Text(&'a str),
}

impl<'a> From<&'a CellValue> for CellKey<'a> {
    fn from(cell: &'a CellValue) -> Self {
        match cell {
            CellValue::Missing => CellKey::Missing,
            // Signed zeros compare equal, and so do all NaNs
            CellValue::Number(value) if *value == 0.0 => CellKey::Number(0f64.to_bits()),
            CellValue::Number(value) if value.is_nan() => CellKey::Number(f64::NAN.to_bits()),
            CellValue::Number(value) => CellKey::Number(value.to_bits()),
            CellValue::Text(text) => CellKey::Text(text),
        }
    }
}

/// Removes rows that repeat an earlier row in every column; the first occurrence is kept
/// and surviving rows keep their relative order.
pub fn deduplicate(table: &Table) -> Table {
    let mut seen = HashSet::<Vec<CellKey>>::new();
    let keep: Vec<usize> = (0..table.row_count())
        .filter(|&index| {
            let key = table.columns().iter().map(|column| CellKey::from(&column.cells()[index])).collect();
            seen.insert(key)
        })
        .collect();

    let removed = table.row_count() - keep.len();
    if removed == 0 {
        tracing::info!(rows = table.row_count(), "no duplicate rows");
        return table.clone();
    }
    tracing::info!(removed, remaining = keep.len(), "removed duplicate rows");

    let columns = table
        .columns()
        .iter()
        .map(|column| Column {
            name: column.name().to_owned(),
            kind: column.kind(),
            cells: keep.iter().map(|&index| column.cells()[index].clone()).collect(),
        })
        .collect();
    Table::from_columns(columns)
}

/// Numeric column whose missing cells were filled.
#[derive(Clone, Debug, PartialEq)]
pub struct FilledColumn {
    pub name: String,
    /// Number of cells replaced
    pub filled: usize,
    /// Column mean used as replacement
    pub mean: f64,
}

/// What mean imputation did to each numeric column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImputeReport {
    pub filled: Vec<FilledColumn>,
    /// Numeric columns with missing cells but no values to average
    pub skipped: Vec<String>,
}

impl ImputeReport {
    /// Total number of cells filled across all columns.
    pub fn filled_cells(&self) -> usize {
        self.filled.iter().map(|column| column.filled).sum()
    }
}

/// Replaces missing cells of numeric columns with the column mean.
pub fn impute_missing(table: &Table) -> Table {
    impute_missing_with_report(table).0
}

/// Same as [`impute_missing`], also reporting which columns were filled or skipped.
/// The mean is taken over the values present before any replacement; text columns
/// are never touched.
pub fn impute_missing_with_report(table: &Table) -> (Table, ImputeReport) {
    let mut report = ImputeReport::default();
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let missing = column.missing_count();
            if !column.kind().is_number() || missing == 0 {
                return column.clone();
            }

            let values: Vec<f64> = column.cells().iter().filter_map(CellValue::as_number).collect();
            if values.is_empty() {
                tracing::warn!(column = column.name(), "column has no values to average, left unchanged");
                report.skipped.push(column.name().to_owned());
                return column.clone();
            }

            let mean = values.iter().sum::<f64>() / values.len() as f64;
            tracing::info!(column = column.name(), filled = missing, mean, "filled missing values");
            report.filled.push(FilledColumn {
                name: column.name().to_owned(),
                filled: missing,
                mean,
            });
            Column {
                name: column.name().to_owned(),
                kind: column.kind(),
                cells: column
                    .cells()
                    .iter()
                    .map(|cell| if cell.is_missing() { CellValue::Number(mean) } else { cell.clone() })
                    .collect(),
            }
        })
        .collect();
    (Table::from_columns(columns), report)
}
