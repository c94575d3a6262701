use crate::table::cell::parse_number;
use crate::table::cell::CellValue;

/// Supported column data types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Floating point numbers
    Number,
    /// Free text
    Text,
}

impl ColumnType {
    /// Returns the string representation of the column type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Text => "text",
        }
    }

    /// Detects the column type from raw values, `None` marking a missing value.
    /// Number only when every present value parses as a number; a column without
    /// any present value counts as numeric.
    pub(crate) fn detect<S: AsRef<str>>(values: &[Option<S>]) -> ColumnType {
        let all_numeric = values
            .iter()
            .flatten()
            .all(|value| parse_number(value.as_ref()).is_some());
        if all_numeric {
            ColumnType::Number
        } else {
            ColumnType::Text
        }
    }

    /// Returns true if this column type holds numbers.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, ColumnType::Number)
    }
}

/// A named, homogeneously typed sequence of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) kind: ColumnType,
    pub(crate) cells: Vec<CellValue>,
}

impl Column {
    /// Creates a numeric column; `None` entries become missing cells.
    pub fn number<N: Into<String>>(name: N, values: Vec<Option<f64>>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnType::Number,
            cells: values.into_iter().map(CellValue::from).collect(),
        }
    }

    /// Creates a text column; `None` entries become missing cells.
    pub fn text<N: Into<String>, S: Into<String>>(name: N, values: Vec<Option<S>>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnType::Text,
            cells: values
                .into_iter()
                .map(|value| value.map(|text| CellValue::Text(text.into())).unwrap_or_default())
                .collect(),
        }
    }

    /// Builds a column from raw decoded values, inferring its type.
    pub(crate) fn infer<N: Into<String>>(name: N, values: Vec<Option<String>>) -> Self {
        let kind = ColumnType::detect(&values);
        let cells = values
            .into_iter()
            .map(|value| match (kind, value) {
                (_, None) => CellValue::Missing,
                (ColumnType::Number, Some(text)) => parse_number(&text)
                    .map(CellValue::Number)
                    .unwrap_or_default(),
                (ColumnType::Text, Some(text)) => CellValue::Text(text),
            })
            .collect();
        Column {
            name: name.into(),
            kind,
            cells,
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column data type.
    pub fn kind(&self) -> ColumnType {
        self.kind
    }

    /// Cells in row order.
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_missing()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|value| value.map(str::to_owned)).collect()
    }

    #[test]
    fn detect_numeric_column() {
        let values = raw(&[Some("1"), None, Some("2.5"), Some(" 3 ")]);
        assert_eq!(ColumnType::detect(&values), ColumnType::Number);
    }

    #[test]
    fn detect_mixed_column_as_text() {
        let values = raw(&[Some("1"), Some("two"), None]);
        assert_eq!(ColumnType::detect(&values), ColumnType::Text);
    }

    #[test]
    fn detect_all_missing_column_as_number() {
        let values = raw(&[None, None]);
        assert_eq!(ColumnType::detect(&values), ColumnType::Number);
    }

    #[test]
    fn infer_keeps_text_verbatim() {
        let column = Column::infer("name", raw(&[Some(" Ann "), Some("7"), None]));
        assert_eq!(column.kind(), ColumnType::Text);
        assert_eq!(
            column.cells(),
            &[
                CellValue::Text(" Ann ".to_owned()),
                CellValue::Text("7".to_owned()),
                CellValue::Missing,
            ]
        );
    }

    #[test]
    fn infer_parses_numbers() {
        let column = Column::infer("score", raw(&[Some("1"), None, Some("3")]));
        assert_eq!(column.kind(), ColumnType::Number);
        assert_eq!(column.cells(), &[CellValue::Number(1.0), CellValue::Missing, CellValue::Number(3.0)]);
        assert_eq!(column.missing_count(), 1);
    }
}
