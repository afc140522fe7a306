use crate::spreadsheet::cell::Cell;

/// A decoded sheet holding its non-empty cells in row-major order.
#[derive(Clone, Debug)]
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// Non-empty cells, sorted by (row, col) once `finish` ran
    pub(crate) cells: Vec<Cell>,
    /// Last row holding a cell
    pub(crate) row_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell, extending the used rows to include it.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.row_upper_bound = Some(self.row_upper_bound.map_or(cell.row, |bound| bound.max(cell.row)));
        self.cells.push(cell);
    }

    /// Sorts cells into row-major order. When a position was written twice the last
    /// write wins, matching how spreadsheet applications resolve it.
    pub(crate) fn finish(&mut self) {
        self.cells.sort_by_key(|cell| (cell.row, cell.col));
        let mut deduplicated: Vec<Cell> = Vec::with_capacity(self.cells.len());
        for cell in self.cells.drain(..) {
            match deduplicated.last_mut() {
                Some(last) if last.row == cell.row && last.col == cell.col => *last = cell,
                _ => deduplicated.push(cell),
            }
        }
        self.cells = deduplicated;
    }

    /// Cells of one row, left to right.
    pub(crate) fn row(&self, row: usize) -> &[Cell] {
        let lower = self.cells.partition_point(|cell| cell.row < row);
        let upper = self.cells.partition_point(|cell| cell.row <= row);
        &self.cells[lower..upper]
    }

    /// Gets the cell at a position, if it holds a value.
    #[cfg(test)]
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        let cells = self.row(row);
        cells
            .binary_search_by_key(&col, |cell| cell.col)
            .ok()
            .map(|index| &cells[index])
    }

    /// Returns a dense rectangular view of the given inclusive range, with `None`
    /// for positions without a value.
    pub(crate) fn grid(
        &self,
        rows: std::ops::RangeInclusive<usize>,
        cols: std::ops::RangeInclusive<usize>,
    ) -> Vec<Vec<Option<&Cell>>> {
        rows.map(|row| {
            let cells = self.row(row);
            let mut index = cells.partition_point(|cell| cell.col < *cols.start());
            cols.clone()
                .map(|col| match cells.get(index) {
                    Some(cell) if cell.col == col => {
                        index += 1;
                        Some(cell)
                    }
                    _ => None,
                })
                .collect()
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;
    use crate::spreadsheet::sheet::Sheet;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::InlineString,
            value: value.to_owned(),
        });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Q1");

        assert!(sheet.is_empty());
        assert_eq!(sheet.row_upper_bound, None);
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("Q1");
        push(&mut sheet, 3, 3, "d");
        push(&mut sheet, 1, 1, "a");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 3, 1, "c");
        sheet.finish();

        assert_eq!(sheet.cells.len(), 4);
        assert_eq!(sheet.row_upper_bound, Some(3));

        let values: Vec<&str> = sheet.cells.iter().map(|cell| cell.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn sheet_finish_keeps_last_write() {
        let mut sheet = Sheet::new("Q1");
        push(&mut sheet, 0, 0, "first");
        push(&mut sheet, 0, 0, "second");
        sheet.finish();

        assert_eq!(sheet.cells.len(), 1);
        assert_eq!(sheet.get(0, 0).map(|cell| cell.value.as_str()), Some("second"));
    }

    #[test]
    fn sheet_lookup() {
        let mut sheet = Sheet::new("Q1");
        push(&mut sheet, 0, 0, "a");
        push(&mut sheet, 0, 2, "b");
        push(&mut sheet, 2, 1, "c");
        sheet.finish();

        assert_eq!(sheet.row(0).len(), 2);
        assert!(sheet.row(1).is_empty());
        assert_eq!(sheet.get(2, 1).map(|cell| cell.value.as_str()), Some("c"));
        assert!(sheet.get(2, 0).is_none());

        let grid = sheet.grid(0..=2, 1..=2);
        let values: Vec<Vec<Option<&str>>> = grid
            .iter()
            .map(|row| row.iter().map(|cell| cell.map(|cell| cell.value.as_str())).collect())
            .collect();
        assert_eq!(
            values,
            vec![vec![None, Some("b")], vec![None, None], vec![Some("c"), None]]
        );
    }
}
