use crate::error::InformeError;
use crate::grid::{CellValue, Grid};
use crate::spreadsheet::cell::Cell;
use tracing::debug;

/// Collects the raw cells of one worksheet and lays them out as a grid.
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in reading order
    pub(crate) cells: Vec<Cell>,
    /// Actual data range (determined from cell data)
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_upper_bound: None,
            col_upper_bound: None,
        }
    }

    /// Adds a cell to the sheet, widening the data range.
    pub(super) fn push(&mut self, cell: Cell) {
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < cell.row).unwrap_or(true) {
            self.row_upper_bound = Some(cell.row);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < cell.col).unwrap_or(true) {
            self.col_upper_bound = Some(cell.col);
        }
        self.cells.push(cell);
    }

    /// Lays the cells out row-major starting at A1.
    ///
    /// Every row ends at its last present cell; rows without cells are empty
    /// vectors, so the grid keeps the vertical gaps of the sheet.
    pub(crate) fn to_grid(&self, shared_strings: &[String]) -> Result<Grid, InformeError> {
        let Some(row_upper_bound) = self.row_upper_bound else {
            return Ok(Grid::new());
        };
        debug!(
            sheet = %self.name,
            rows = row_upper_bound + 1,
            cols = self.col_upper_bound.map(|col| col + 1).unwrap_or(0),
            "Laying out sheet grid"
        );
        let mut grid: Grid = vec![Vec::new(); row_upper_bound + 1];
        for cell in &self.cells {
            let value = cell.to_value(shared_strings)?;
            if value == CellValue::Empty {
                continue;
            }
            let row = &mut grid[cell.row];
            if row.len() <= cell.col {
                row.resize(cell.col + 1, CellValue::Empty);
            }
            row[cell.col] = value;
        }
        // Cells that decoded to nothing leave trailing blanks behind
        while grid.last().map(Vec::is_empty).unwrap_or(false) {
            grid.pop();
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use crate::grid::CellValue;
    use crate::spreadsheet::cell::{Cell, CellType};
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
        let sheet = Sheet::new("Hoja1");

        assert!(sheet.cells.is_empty());
        assert_eq!(sheet.row_upper_bound, None);
        assert_eq!(sheet.col_upper_bound, None);
        assert!(sheet.to_grid(&[]).unwrap().is_empty());
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("Hoja1");
        push(&mut sheet, 1, 1, "a");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 3, 1, "c");

        assert_eq!(sheet.cells.len(), 3);
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_upper_bound, Some(3));

        let grid = sheet.to_grid(&[]).unwrap();
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty());
        assert_eq!(grid[1], vec![CellValue::Empty, CellValue::text("a"), CellValue::Empty, CellValue::text("b")]);
        assert!(grid[2].is_empty());
        assert_eq!(grid[3], vec![CellValue::Empty, CellValue::text("c")]);
    }

    #[test]
    fn sheet_drops_trailing_empty_rows() {
        let mut sheet = Sheet::new("Hoja1");
        push(&mut sheet, 0, 0, "a");
        push(&mut sheet, 4, 0, "");

        let grid = sheet.to_grid(&[]).unwrap();
        assert_eq!(grid, vec![vec![CellValue::text("a")]]);
    }
}
