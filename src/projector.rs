//! Column selection.
use crate::table::Column;
use crate::table::Table;
use std::collections::HashSet;
use thiserror::Error;

/// A requested column does not exist in the table.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown column '{name}' (available: {})", .available.join(", "))]
pub struct UnknownColumnError {
    pub name: String,
    pub available: Vec<String>,
}

/// Returns a table holding exactly the requested columns in the requested order.
/// Repeated names collapse to their first occurrence. Nothing is produced unless every
/// name resolves.
pub fn project<S: AsRef<str>>(table: &Table, names: &[S]) -> Result<Table, UnknownColumnError> {
    let mut seen = HashSet::<&str>::new();
    let mut selected = Vec::<&Column>::with_capacity(names.len());
    for name in names.iter().map(AsRef::as_ref) {
        if !seen.insert(name) {
            continue;
        }
        let column = table.column(name).ok_or_else(|| UnknownColumnError {
            name: name.to_owned(),
            available: table.column_names().iter().map(|name| name.to_string()).collect(),
        })?;
        selected.push(column);
    }
    tracing::debug!(columns = ?seen, "projected columns");
    Ok(Table::from_columns(selected.into_iter().cloned().collect()))
}
