//! # Spreadsheet Parsing
//!
//! Streaming readers for Office Open XML (`.xlsx`, `.xlsm`, `.xlam`) and
//! OpenDocument (`.ods`) workbooks. Every sheet is exposed as a [`Grid`]
//! anchored at A1, ready for table detection.
//!
//! Legacy binary workbooks (`.xls`, `.xlsb`) are rejected with
//! [`SpreadsheetError::UnsupportedFormat`].
pub(crate) mod cell;
pub(crate) mod excel;
pub mod ods;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::error::InformeError;
use crate::grid::Grid;
use crate::helpers::reader::SourceReader;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::ods::OdsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Unsupported spreadsheet format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    EmptySpreadsheet(String),

    #[error("Sheet #{0} not found")]
    SheetNotFound(usize),

    #[error("Missing entry '{0}' in spreadsheet container")]
    FileError(String),
}

/// A workbook whose sheets can be read as grids.
pub trait Spreadsheet {
    /// File name the workbook was opened from.
    fn name(&self) -> String;

    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Reads the sheet at `index` (0-based) into a grid.
    fn read_grid(&mut self, index: usize) -> Result<Grid, InformeError>;
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Format {
    Xlsx,
    Ods,
}

impl Format {
    fn from_extension(name: &str) -> Result<Option<Format>, SpreadsheetError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase());
        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xlam" | "xltx" | "xltm") => Ok(Some(Format::Xlsx)),
            Some("ods") => Ok(Some(Format::Ods)),
            Some("xls" | "xlsb" | "xla") => Err(SpreadsheetError::UnsupportedFormat(name.to_owned())),
            _ => Ok(None),
        }
    }

    /// Guesses the format from the ZIP entries, then rewinds the reader
    ///
    /// # Arguments
    /// * `reader` - Seekable source of the file bytes
    ///
    /// # Returns
    /// The detected format, or `None` when the bytes are not a known container
    fn sniff<RS: Read + Seek>(reader: &mut RS) -> Option<Format> {
        let format = ZipArchive::new(&mut *reader).ok().and_then(|mut zip| {
            if matches!(zip.file("xl/workbook.xml"), Ok(Some(_))) {
                Some(Format::Xlsx)
            } else if matches!(zip.read_text("mimetype"), Ok(Some(mime)) if mime.trim().as_bytes() == ods::MIME_TYPE) {
                Some(Format::Ods)
            } else {
                None
            }
        });
        reader.seek(SeekFrom::Start(0)).ok()?;
        format
    }
}

fn open_reader(name: &str, mut reader: SourceReader) -> Result<Box<dyn Spreadsheet>, InformeError> {
    let format = match Format::from_extension(name)? {
        Some(format) => format,
        None => Format::sniff(&mut reader).ok_or_else(|| SpreadsheetError::UnsupportedFormat(name.to_owned()))?,
    };
    debug!(name, ?format, "Opening spreadsheet");
    match format {
        Format::Xlsx => Ok(Box::new(XlsxSpreadsheet::open(name, reader)?)),
        Format::Ods => Ok(Box::new(OdsSpreadsheet::open(name, reader)?)),
    }
}

/// Opens a workbook from disk
///
/// The format is chosen by extension, falling back to the archive content.
///
/// # Arguments
/// * `path` - Path of the `.xlsx`, `.xlsm` or `.ods` file
///
/// # Returns
/// The opened workbook, ready to read sheets as grids
pub fn open(path: &Path) -> Result<Box<dyn Spreadsheet>, InformeError> {
    let name = path.to_string_lossy();
    open_reader(&name, SourceReader::open(path)?)
}

/// Opens a workbook already loaded in memory, e.g. an uploaded file
///
/// # Arguments
/// * `name` - Original file name; its extension selects the format when known
/// * `bytes` - Complete file content
///
/// # Returns
/// The opened workbook, ready to read sheets as grids
pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Box<dyn Spreadsheet>, InformeError> {
    open_reader(name, SourceReader::from_bytes(bytes))
}

/// Reads the first sheet of a workbook on disk
///
/// # Arguments
/// * `path` - Path of the workbook
///
/// # Returns
/// Grid of the first sheet, anchored at A1
pub fn read_first_grid(path: &Path) -> Result<Grid, InformeError> {
    open(path)?.read_grid(0)
}
