use crate::error::InformeError;
use crate::grid::Grid;
use crate::helpers::reader::SourceReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

/// ODS file MIME type identifier
pub(crate) const MIME_TYPE: &[u8] = b"application/vnd.oasis.opendocument.spreadsheet";
const TABLE: QName = QName(b"table:table");
const TABLE_ROW: QName = QName(b"table:table-row");
const TABLE_CELL: QName = QName(b"table:table-cell");
/// Cells hidden by a merge
const TABLE_COVERED_CELL: QName = QName(b"table:covered-table-cell");
/// Comments attached to a cell
const ANNOTATION: QName = QName(b"office:annotation");
const PARAGRAPH: QName = QName(b"text:p");
/// Run of `text:c` spaces
const SPACES: QName = QName(b"text:s");

/// Rows repeated past this point only fill out the sheet to its maximum size.
const MAX_REPEATED_ROWS: usize = 1 << 16;
const MAX_REPEATED_COLS: usize = 1 << 10;

#[derive(Error, Debug)]
pub enum OdsError {
    #[error("Invalid ODS MIME type")]
    MimeTypeError,
}

/// An OpenDocument spreadsheet (`.ods`).
pub(crate) struct OdsSpreadsheet {
    pub(crate) name: String,
    zip: ZipArchive<SourceReader>,
    sheets: Vec<String>,
}

impl OdsSpreadsheet {
    /// Opens the document and loads its sheet list
    ///
    /// # Arguments
    /// * `name` - File name, used in error messages
    /// * `reader` - Source of the file bytes
    ///
    /// # Returns
    /// The opened spreadsheet; sheets are read on demand
    pub(crate) fn open(name: &str, reader: SourceReader) -> Result<Self, InformeError> {
        let mut zip = ZipArchive::new(reader)?;
        check_mime(&mut zip)?;
        let sheets = load_sheet_names(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::EmptySpreadsheet(name.to_owned()))?
        }
        Ok(OdsSpreadsheet {
            name: name.to_owned(),
            zip,
            sheets,
        })
    }

    /// Reads the cells of one table in `content.xml`
    ///
    /// # Arguments
    /// * `index` - Table position in document order
    ///
    /// # Returns
    /// Sparse sheet with repeated rows and columns expanded up to the caps
    fn read_sheet(&mut self, index: usize) -> Result<Sheet, InformeError> {
        let sheet_name = self.sheets
            .get(index)
            .cloned()
            .ok_or(SpreadsheetError::SheetNotFound(index))?;
        let mut sheet = Sheet::new(&sheet_name);
        let mut reader = self.zip
            .xml_reader("content.xml")?
            .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;

        // Skip ahead to the requested table
        let mut table_index = 0usize;
        let mut found = false;
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TABLE => {
                if table_index == index {
                    found = true;
                    break;
                }
                table_index += 1;
            }
        });
        if !found {
            Err(SpreadsheetError::SheetNotFound(index))?
        }

        let mut row = 0usize;
        let mut col = 0usize;
        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        let mut element_context = false;
        let mut comment_context = false;
        match_xml_events!(reader => {
            Event::End(event) if event.name() == TABLE => break,
            Event::Start(event) if event.name() == TABLE_ROW => {
                row_count = event.parse_attribute_value("table:number-rows-repeated")?.unwrap_or(1);
                col = 0;
            }
            Event::End(event) if event.name() == TABLE_ROW => {
                row += row_count;
            }
            Event::Start(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                value.clear();
                col_count = event.parse_attribute_value::<usize>("table:number-columns-repeated")?.unwrap_or(1);
                kind = CellType::Empty;
                if let Some(value_type) = event.get_attribute_value("office:value-type")? {
                    match value_type.as_ref() {
                        "string" => {
                            let is_error = event.get_attribute_value("calcext:value-type")?
                                .map(|cow| cow == "error")
                                .unwrap_or(false);
                            kind = if is_error { CellType::Error } else { CellType::InlineString };
                            element_context = true;
                        }
                        "boolean" => {
                            kind = CellType::Boolean;
                            let is_true = event.get_attribute_value("office:boolean-value")?
                                .map(|cow| cow != "false" && cow != "0")
                                .unwrap_or(false);
                            value.push_str(if is_true { "1" } else { "0" });
                        }
                        "date" => {
                            kind = CellType::IsoDateTime;
                            if let Some(data) = event.get_attribute_value("office:date-value")? {
                                value.push_str(&data);
                            }
                        }
                        "time" => {
                            kind = CellType::IsoDuration;
                            if let Some(data) = event.get_attribute_value("office:time-value")? {
                                value.push_str(&data);
                            }
                        }
                        _ => {
                            kind = CellType::Number;
                            if let Some(data) = event.get_attribute_value("office:value")? {
                                value.push_str(&data);
                            }
                        }
                    }
                }
            }
            Event::End(event) if event.name() == TABLE_CELL || event.name() == TABLE_COVERED_CELL => {
                if kind == CellType::Error {
                    debug!(sheet = %sheet_name, cell = %index_to_reference(row, col), %value, "Error cell kept as text");
                }
                if kind != CellType::Empty && !value.is_empty() {
                    for row_offset in 0..row_count.min(MAX_REPEATED_ROWS) {
                        for col_offset in 0..col_count.min(MAX_REPEATED_COLS) {
                            sheet.push(Cell {
                                row: row + row_offset,
                                col: col + col_offset,
                                kind,
                                value: value.to_owned(),
                            });
                        }
                    }
                }
                col += col_count;
                element_context = false;
                comment_context = false;
            }
            Event::Start(event) if element_context && event.name() == ANNOTATION => comment_context = true,
            Event::End(event) if element_context && comment_context && event.name() == ANNOTATION => comment_context = false,
            Event::Start(event) if element_context && !comment_context && event.name() == PARAGRAPH => {
                if !value.is_empty() {
                    value.push('\n');
                }
            }
            Event::Start(event) if element_context && !comment_context && event.name() == SPACES => {
                let count = event.parse_attribute_value("text:c")?.unwrap_or(1);
                for _ in 0..count {
                    value.push(' ');
                }
            }
            Event::Text(event) if element_context && !comment_context => value.push_bytes_text(&event)?,
            Event::GeneralRef(event) if element_context && !comment_context => value.push_bytes_ref(&event)?,
        });
        Ok(sheet)
    }
}

impl Spreadsheet for OdsSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.to_owned()
    }

    fn read_grid(&mut self, index: usize) -> Result<Grid, InformeError> {
        self.read_sheet(index)?.to_grid(&[])
    }
}

/// Validates the `mimetype` entry of the archive
///
/// A missing entry is tolerated; a wrong one is not.
///
/// # Arguments
/// * `zip` - Zip archive handle
fn check_mime<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(), InformeError> {
    if let Some(file) = &mut zip.file("mimetype")? {
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        if buffer.trim_ascii() != MIME_TYPE {
            Err(OdsError::MimeTypeError)?;
        }
    }
    Ok(())
}

/// Lists the table names of the document
///
/// # Arguments
/// * `zip` - Zip archive handle
///
/// # Returns
/// Table names in document order; unnamed tables get `SheetN`
fn load_sheet_names(zip: &mut ZipArchive<SourceReader>) -> Result<Vec<String>, InformeError> {
    let mut reader = zip
        .xml_reader("content.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("content.xml".to_owned()))?;
    let mut names = Vec::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TABLE => {
            let name = event.get_attribute_value("table:name")?
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("Sheet{}", names.len() + 1));
            names.push(name);
        }
    });
    Ok(names)
}
