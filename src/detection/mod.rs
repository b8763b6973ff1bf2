//! # Table Region Detection
//!
//! Infers logical tables from a raw spreadsheet grid. Three strategies are
//! tried in order and the first one that finds more than one table wins:
//!
//! 1. Region growing: connected components of non-empty cells (8-directional
//!    adjacency) whose bounding boxes are dense enough to look like tables.
//! 2. Vertical segmentation: runs of rows separated by two or more blank rows.
//! 3. Whole grid: everything as a single table titled `Tabla Principal`.
//!
//! Detection is a pure function of its input and never fails; an empty result
//! means nothing table-shaped was found.
mod region;
mod segment;
mod table;

pub use table::synthesize_title;
pub use table::LogicalTable;

use crate::grid::CellValue;
use region::CellPresenceMap;
use region::Region;
use segment::split_on_blank_runs;
use table::{has_any_value, has_header_and_data, has_rows_after_first, normalize_rows, strip_blank_rows, MAIN_TABLE_TITLE};
use tracing::debug;

/// Thresholds used to decide what counts as a table.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionCriteria {
    /// Minimum bounding box width of a tabular region.
    pub min_width: usize,
    /// Minimum bounding box height of a tabular region.
    pub min_height: usize,
    /// Minimum number of non-empty cells in a tabular region.
    pub min_cells: usize,
    /// Minimum share of the bounding box covered by non-empty cells.
    pub min_density: f64,
    /// Consecutive blank rows that separate two tables vertically.
    pub blank_rows_boundary: usize,
}

impl Default for DetectionCriteria {
    fn default() -> Self {
        Self {
            min_width: 2,
            min_height: 2,
            min_cells: 4,
            min_density: 0.3,
            blank_rows_boundary: 2,
        }
    }
}

impl DetectionCriteria {
    /// Returns true if the region is shaped like a table.
    fn accept(&self, region: &Region) -> bool {
        region.width() >= self.min_width
            && region.height() >= self.min_height
            && region.cells >= self.min_cells
            && region.density() >= self.min_density
    }
}

/// A detection strategy returning the tables it found, in emission order.
type Strategy = fn(&[Vec<CellValue>], &DetectionCriteria) -> Vec<LogicalTable>;

/// Detects tables using the default criteria.
pub fn detect_tables(grid: &[Vec<CellValue>]) -> Vec<LogicalTable> {
    detect_tables_with(grid, &DetectionCriteria::default())
}

/// Detects tables using explicit criteria.
pub fn detect_tables_with(grid: &[Vec<CellValue>], criteria: &DetectionCriteria) -> Vec<LogicalTable> {
    if grid.is_empty() {
        return Vec::new();
    }

    let strategies: [(&str, Strategy); 2] = [
        ("regions", detect_by_regions),
        ("blank rows", detect_by_blank_rows),
    ];
    for (name, strategy) in strategies {
        let tables = strategy(grid, criteria);
        debug!("Table detection by {} found {} table(s)", name, tables.len());
        if tables.len() > 1 {
            return tables;
        }
    }

    let tables = detect_whole_grid(grid);
    debug!("Table detection fell back to the whole grid: {} table(s)", tables.len());
    tables
}

/// Emits one table per dense connected region, in discovery order.
fn detect_by_regions(grid: &[Vec<CellValue>], criteria: &DetectionCriteria) -> Vec<LogicalTable> {
    let mut tables = Vec::<LogicalTable>::new();
    for region in CellPresenceMap::new(grid).regions() {
        if !criteria.accept(&region) {
            debug!(
                "Skipping region rows {}..={} cols {}..={} ({} cells, density {:.2})",
                region.row_lower_bound,
                region.row_upper_bound,
                region.col_lower_bound,
                region.col_upper_bound,
                region.cells,
                region.density(),
            );
            continue;
        }
        let rows = strip_blank_rows(region.extract(grid));
        if has_header_and_data(&rows) {
            let number = tables.len() + 1;
            let title = table::synthesize_title(&rows[0], number);
            tables.push(LogicalTable::new(number, title, rows, region.row_lower_bound, region.row_upper_bound));
        }
    }
    tables
}

/// Emits one table per run of rows separated by blank-row boundaries.
fn detect_by_blank_rows(grid: &[Vec<CellValue>], criteria: &DetectionCriteria) -> Vec<LogicalTable> {
    let mut tables = Vec::<LogicalTable>::new();
    for segment in split_on_blank_runs(grid, criteria.blank_rows_boundary) {
        let rows = normalize_rows(&strip_blank_rows(grid[segment.start_row..=segment.end_row].to_vec()));
        if has_any_value(&rows) {
            let number = tables.len() + 1;
            let title = table::synthesize_title(&rows[0], number);
            tables.push(LogicalTable::new(number, title, rows, segment.start_row, segment.end_row));
        }
    }
    tables
}

/// Treats the whole grid as a single table.
///
/// No textual header is required here, so headerless numeric exports still
/// come out as one table; a lone row does not.
fn detect_whole_grid(grid: &[Vec<CellValue>]) -> Vec<LogicalTable> {
    let rows = normalize_rows(&strip_blank_rows(grid.to_vec()));
    if !has_rows_after_first(&rows) {
        return Vec::new();
    }
    vec![LogicalTable::new(1, MAIN_TABLE_TITLE.to_owned(), rows, 0, grid.len() - 1)]
}
