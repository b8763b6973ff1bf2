use crate::grid::{is_blank_row, CellValue};

/// Contiguous run of grid rows between blank-row boundaries.
#[derive(Debug, PartialEq)]
pub(crate) struct Segment {
    /// First row of the run (0-based, inclusive)
    pub(crate) start_row: usize,
    /// Last non-blank row of the run (0-based, inclusive)
    pub(crate) end_row: usize,
}

/// Splits the grid vertically wherever `boundary` or more consecutive blank rows occur.
///
/// Leading blank rows are skipped and the end of the grid closes the last segment.
/// Single blank rows inside a segment do not split it.
pub(crate) fn split_on_blank_runs(grid: &[Vec<CellValue>], boundary: usize) -> Vec<Segment> {
    let boundary = boundary.max(1);
    let blank: Vec<bool> = grid.iter().map(|row| is_blank_row(row)).collect();
    let mut segments = Vec::<Segment>::new();
    let mut row = 0usize;
    while row < blank.len() {
        // Skip blank rows ahead of the next segment
        while row < blank.len() && blank[row] {
            row += 1;
        }
        if row == blank.len() {
            break;
        }

        let start_row = row;
        let mut end_row = row;
        let mut blank_run = 0usize;
        while row < blank.len() {
            if blank[row] {
                blank_run += 1;
                if blank_run >= boundary {
                    break;
                }
            } else {
                blank_run = 0;
                end_row = row;
            }
            row += 1;
        }
        segments.push(Segment { start_row, end_row });
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::text_grid;

    #[test]
    fn splits_on_double_blank_rows() {
        let grid = text_grid(&[
            &["", ""],
            &["a", "b"],
            &["c", "d"],
            &["", ""],
            &["", ""],
            &["", ""],
            &["e", "f"],
        ]);
        assert_eq!(split_on_blank_runs(&grid, 2), vec![
            Segment { start_row: 1, end_row: 2 },
            Segment { start_row: 6, end_row: 6 },
        ]);
    }

    #[test]
    fn single_blank_row_stays_inside() {
        let grid = text_grid(&[&["a"], &[""], &["b"], &[""]]);
        assert_eq!(split_on_blank_runs(&grid, 2), vec![Segment { start_row: 0, end_row: 2 }]);
    }

    #[test]
    fn ragged_and_empty_rows_are_blank() {
        let grid = text_grid(&[&["a"], &[], &["  "], &["b"]]);
        assert_eq!(split_on_blank_runs(&grid, 2), vec![
            Segment { start_row: 0, end_row: 0 },
            Segment { start_row: 3, end_row: 3 },
        ]);
    }

    #[test]
    fn all_blank_grid_has_no_segments() {
        assert!(split_on_blank_runs(&text_grid(&[&[""], &[""]]), 2).is_empty());
        assert!(split_on_blank_runs(&[], 2).is_empty());
    }
}
