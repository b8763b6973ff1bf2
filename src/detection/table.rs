use crate::grid::{is_blank_row, CellValue};

/// Header keywords that promote a column name into the table title.
const TITLE_KEYWORDS: [&str; 6] = ["ventas", "ingresos", "gastos", "empleados", "productos", "clientes"];

/// Number of header cells considered when synthesizing a title.
const TITLE_HEADERS: usize = 3;

/// Title given to the whole-grid fallback table.
pub(crate) const MAIN_TABLE_TITLE: &str = "Tabla Principal";

/// One table found inside a spreadsheet grid.
#[derive(Clone, Debug, PartialEq)]
pub struct LogicalTable {
    /// Sequential identifier within one detection call (`tabla_1`, `tabla_2`, ...)
    pub id: String,
    /// Synthesized title
    pub title: Option<String>,
    /// Header row followed by data rows, blank rows removed
    pub data: Vec<Vec<CellValue>>,
    /// First grid row covered by the table (0-based, inclusive)
    pub start_row: usize,
    /// Last grid row covered by the table (0-based, inclusive)
    pub end_row: usize,
}

impl LogicalTable {
    pub(crate) fn new(number: usize, title: String, data: Vec<Vec<CellValue>>, start_row: usize, end_row: usize) -> Self {
        Self {
            id: format!("tabla_{}", number),
            title: Some(title),
            data,
            start_row,
            end_row,
        }
    }

    /// Header row of the table, empty when the table has no rows.
    pub fn header(&self) -> &[CellValue] {
        self.data.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Rows after the header.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        self.data.get(1..).unwrap_or_default()
    }
}

/// Removes rows in which every cell is empty.
pub(crate) fn strip_blank_rows(rows: Vec<Vec<CellValue>>) -> Vec<Vec<CellValue>> {
    rows.into_iter().filter(|row| !is_blank_row(row)).collect()
}

/// Pads ragged rows to a common width and cleans every cell.
pub(crate) fn normalize_rows(rows: &[Vec<CellValue>]) -> Vec<Vec<CellValue>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    rows.iter()
        .map(|row| {
            let mut cleaned: Vec<CellValue> = row.iter().map(CellValue::cleaned).collect();
            cleaned.resize(width, CellValue::Empty);
            cleaned
        })
        .collect()
}

/// Header/data heuristic: at least two rows, a textual cell in the first row
/// and a non-empty cell in some later row.
pub(crate) fn has_header_and_data(rows: &[Vec<CellValue>]) -> bool {
    if rows.len() < 2 {
        return false;
    }
    let has_header = rows[0].iter().any(|cell| !cell.is_empty() && !cell.is_numeric());
    let has_data = rows[1..].iter().any(|row| !is_blank_row(row));
    has_header && has_data
}

/// At least two rows with something below the first; the first row may be numeric.
pub(crate) fn has_rows_after_first(rows: &[Vec<CellValue>]) -> bool {
    rows.len() >= 2 && rows[1..].iter().any(|row| !is_blank_row(row))
}

/// True when any cell of any row holds a value.
pub(crate) fn has_any_value(rows: &[Vec<CellValue>]) -> bool {
    rows.iter().any(|row| !is_blank_row(row))
}

/// Builds a human readable title from the header row.
///
/// `number` is the 1-based position of the table within the detection call.
pub fn synthesize_title(header: &[CellValue], number: usize) -> String {
    let headers: Vec<String> = header
        .iter()
        .filter(|cell| !cell.is_empty())
        .take(TITLE_HEADERS)
        .map(|cell| cell.to_string().trim().to_owned())
        .collect();

    if headers.is_empty() {
        return format!("Tabla {}", number);
    }

    let keyword_header = headers.iter().find(|header| {
        let lowercase = header.to_lowercase();
        TITLE_KEYWORDS.iter().any(|keyword| lowercase.contains(keyword))
    });

    if let Some(header) = keyword_header {
        format!("Tabla de {}", header)
    } else if headers.len() == 1 {
        format!("Tabla: {}", headers[0])
    } else {
        format!("Tabla {} ({}, {}...)", number, headers[0], headers[1])
    }
}
