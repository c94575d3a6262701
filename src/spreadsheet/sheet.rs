use crate::spreadsheet::cell::Cell;

/// Cells collected from one worksheet along with the bounds of the used range.
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in the sheet
    pub(crate) cells: Vec<Cell>,
    /// Actual data range (determined from cell data)
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell to the sheet, updating the data range.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Number of rows and columns spanned by the used range.
    pub(crate) fn dimensions(&self) -> Option<(usize, usize)> {
        let (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) = (
            self.row_lower_bound,
            self.row_upper_bound,
            self.col_lower_bound,
            self.col_upper_bound,
        ) else {
            return None;
        };
        let rows = (row_upper - row_lower).checked_add(1)?;
        let width = (col_upper - col_lower).checked_add(1)?;
        Some((rows, width))
    }

    /// Buckets the cells by column offset within the used range.
    /// Each bucket holds (row offset, cell) pairs in sheet order, so a later cell at the
    /// same position comes last.
    pub(crate) fn columns(&self) -> Vec<Vec<(usize, &Cell)>> {
        let (Some(row_lower), Some(col_lower), Some((_, width))) =
            (self.row_lower_bound, self.col_lower_bound, self.dimensions())
        else {
            return Vec::new();
        };

        let mut columns: Vec<Vec<(usize, &Cell)>> = vec![Vec::new(); width];
        for cell in &self.cells {
            columns[cell.col - col_lower].push((cell.row - row_lower, cell));
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;
    use crate::spreadsheet::sheet::Sheet;

    fn push(sheet: &mut Sheet, row: usize, col: usize) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: format!("{row}:{col}"),
        });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Sheet1");

        assert!(sheet.is_empty());
        assert_eq!(sheet.row_lower_bound, None);
        assert_eq!(sheet.row_upper_bound, None);
        assert_eq!(sheet.col_lower_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert_eq!(sheet.dimensions(), None);
        assert!(sheet.columns().is_empty());
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 1, 1);
        push(&mut sheet, 1, 3);
        push(&mut sheet, 3, 1);
        push(&mut sheet, 3, 3);

        assert_eq!(sheet.cells.len(), 4);
        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));
    }

    #[test]
    fn sheet_columns_keep_gaps() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 1, 1);
        push(&mut sheet, 1, 3);
        push(&mut sheet, 3, 2);

        assert_eq!(sheet.dimensions(), Some((3, 3)));
        let columns: Vec<Vec<(usize, &str)>> = sheet
            .columns()
            .iter()
            .map(|cells| cells.iter().map(|(row, cell)| (*row, cell.value.as_str())).collect())
            .collect();
        assert_eq!(columns, vec![vec![(0, "1:1")], vec![(2, "3:2")], vec![(0, "1:3")]]);
    }

    #[test]
    fn far_apart_cells_stay_sparse() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 0, 0);
        push(&mut sheet, 1_048_575, 16_383);

        assert_eq!(sheet.dimensions(), Some((1_048_576, 16_384)));
        let columns = sheet.columns();
        assert_eq!(columns.len(), 16_384);
        assert_eq!(columns.iter().map(Vec::len).sum::<usize>(), 2);
    }
}
