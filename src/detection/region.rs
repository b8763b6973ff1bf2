use crate::grid::{grid_width, CellValue};
use std::collections::VecDeque;

/// Row/column offsets of the eight neighbours of a cell.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Boolean grid marking non-empty cells; rebuilt for every detection call.
pub(crate) struct CellPresenceMap {
    rows: usize,
    cols: usize,
    present: Vec<bool>,
}

impl CellPresenceMap {
    pub(crate) fn new(grid: &[Vec<CellValue>]) -> Self {
        let rows = grid.len();
        let cols = grid_width(grid);
        let mut present = vec![false; rows * cols];
        for (row, cells) in grid.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                present[row * cols + col] = !cell.is_empty();
            }
        }
        Self { rows, cols, present }
    }

    pub(crate) fn is_present(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols && self.present[row * self.cols + col]
    }

    /// Labels connected components of present cells with 8-directional adjacency.
    ///
    /// Seeds are visited in row-major order, so regions come back in discovery order.
    pub(crate) fn regions(&self) -> Vec<Region> {
        let mut visited = vec![false; self.rows * self.cols];
        let mut queue = VecDeque::<(usize, usize)>::new();
        let mut regions = Vec::<Region>::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if visited[row * self.cols + col] || !self.is_present(row, col) {
                    continue;
                }
                visited[row * self.cols + col] = true;
                queue.push_back((row, col));
                let mut region = Region::seed(row, col);
                while let Some((row, col)) = queue.pop_front() {
                    region.include(row, col);
                    for (row_offset, col_offset) in NEIGHBOURS {
                        let (Some(next_row), Some(next_col)) = (
                            row.checked_add_signed(row_offset),
                            col.checked_add_signed(col_offset),
                        ) else {
                            continue;
                        };
                        if self.is_present(next_row, next_col) && !visited[next_row * self.cols + next_col] {
                            visited[next_row * self.cols + next_col] = true;
                            queue.push_back((next_row, next_col));
                        }
                    }
                }
                regions.push(region);
            }
        }
        regions
    }
}

/// Connected block of present cells with its inclusive bounding box.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Region {
    pub(crate) row_lower_bound: usize,
    pub(crate) row_upper_bound: usize,
    pub(crate) col_lower_bound: usize,
    pub(crate) col_upper_bound: usize,
    pub(crate) cells: usize,
}

impl Region {
    fn seed(row: usize, col: usize) -> Self {
        Self {
            row_lower_bound: row,
            row_upper_bound: row,
            col_lower_bound: col,
            col_upper_bound: col,
            cells: 0,
        }
    }

    fn include(&mut self, row: usize, col: usize) {
        self.row_lower_bound = self.row_lower_bound.min(row);
        self.row_upper_bound = self.row_upper_bound.max(row);
        self.col_lower_bound = self.col_lower_bound.min(col);
        self.col_upper_bound = self.col_upper_bound.max(col);
        self.cells += 1;
    }

    pub(crate) fn width(&self) -> usize {
        self.col_upper_bound - self.col_lower_bound + 1
    }

    pub(crate) fn height(&self) -> usize {
        self.row_upper_bound - self.row_lower_bound + 1
    }

    /// Share of the bounding box covered by present cells.
    pub(crate) fn density(&self) -> f64 {
        self.cells as f64 / (self.width() * self.height()) as f64
    }

    /// Copies the bounding box out of the grid, filling missing cells with empty values.
    pub(crate) fn extract(&self, grid: &[Vec<CellValue>]) -> Vec<Vec<CellValue>> {
        (self.row_lower_bound..=self.row_upper_bound)
            .map(|row| {
                (self.col_lower_bound..=self.col_upper_bound)
                    .map(|col| {
                        grid.get(row)
                            .and_then(|cells| cells.get(col))
                            .map(CellValue::cleaned)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::text_grid;

    #[test]
    fn presence_map_handles_ragged_rows() {
        let grid = text_grid(&[&["a", "", "b"], &["c"]]);
        let map = CellPresenceMap::new(&grid);
        assert!(map.is_present(0, 0));
        assert!(!map.is_present(0, 1));
        assert!(map.is_present(0, 2));
        assert!(map.is_present(1, 0));
        assert!(!map.is_present(1, 2));
        assert!(!map.is_present(5, 5));
    }

    #[test]
    fn regions_in_discovery_order() {
        let grid = text_grid(&[
            &["", "", "", "x", "x"],
            &["a", "a", "", "x", "x"],
            &["a", "a", "", "", ""],
        ]);
        let regions = CellPresenceMap::new(&grid).regions();
        assert_eq!(regions.len(), 2);

        assert_eq!(regions[0].row_lower_bound, 0);
        assert_eq!(regions[0].col_lower_bound, 3);
        assert_eq!(regions[0].cells, 4);

        assert_eq!(regions[1].row_lower_bound, 1);
        assert_eq!(regions[1].row_upper_bound, 2);
        assert_eq!(regions[1].col_lower_bound, 0);
        assert_eq!(regions[1].col_upper_bound, 1);
    }

    #[test]
    fn diagonal_neighbours_merge() {
        let grid = text_grid(&[
            &["a", "a", "", ""],
            &["a", "a", "", ""],
            &["", "", "b", "b"],
            &["", "", "b", "b"],
        ]);
        let regions = CellPresenceMap::new(&grid).regions();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].cells, 8);
        assert_eq!(regions[0].width(), 4);
        assert_eq!(regions[0].height(), 4);
        assert!((regions[0].density() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn extract_fills_missing_cells() {
        let grid = text_grid(&[&["a", " b "], &["c"]]);
        let region = Region {
            row_lower_bound: 0,
            row_upper_bound: 1,
            col_lower_bound: 0,
            col_upper_bound: 1,
            cells: 3,
        };
        assert_eq!(region.extract(&grid), vec![
            vec![CellValue::text("a"), CellValue::text("b")],
            vec![CellValue::text("c"), CellValue::Empty],
        ]);
    }
}
