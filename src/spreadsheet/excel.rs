//! Microsoft Office Excel Helpers
use crate::error::InformeError;
use crate::helpers::reader::SourceReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use zip::ZipArchive;

/// XML tag name for relationship elements in Excel files
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Opens the Excel container and loads the workbook structure
///
/// # Arguments
/// * `name` - File name, used in error messages
/// * `reader` - Source of the workbook bytes
/// * `load_workbook` - Function returning the worksheet list and the 1904 date flag
/// * `load_number_formats` - Function mapping style indexes to cell types
///
/// # Returns
/// Tuple containing:
/// - Zip archive handle
/// - Cell type implied by every style index
/// - List of worksheet names and their zip paths
pub(super) fn open<W, F>(name: &str, reader: SourceReader, load_workbook: W, load_number_formats: F) -> Result<(
    ZipArchive<SourceReader>,
    Vec<CellType>,
    Vec<(String, String)>
), InformeError>
where
    W: Fn(&mut ZipArchive<SourceReader>) -> Result<(Vec<(String, String)>, bool), InformeError>,
    F: Fn(&mut ZipArchive<SourceReader>, bool) -> Result<Vec<CellType>, InformeError>,
{
    let mut zip = ZipArchive::new(reader)?;
    let (sheets, is_1904) = load_workbook(&mut zip)?;
    if sheets.is_empty() {
        Err(SpreadsheetError::EmptySpreadsheet(name.to_owned()))?
    }

    let number_formats = load_number_formats(&mut zip, is_1904)?;
    Ok((zip, number_formats, sheets))
}

/// Loads worksheet relationships of the workbook
///
/// # Arguments
/// * `zip` - Zip archive handle
/// * `path` - Path of the relationships XML file within the archive
///
/// # Returns
/// Mapping of relationship ids to worksheet paths
pub(super) fn load_relationships(zip: &mut ZipArchive<SourceReader>, path: &str) -> Result<HashMap<String, String>, InformeError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheets; chartsheets and dialogs carry no cells
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves the number format of every style to the cell type it implies
///
/// # Arguments
/// * `format_indexes` - Number format id of each style, in style order
/// * `custom_formats` - Custom formats declared by the workbook
/// * `is_1904` - Whether the workbook uses the 1904 date system
///
/// # Returns
/// Cell type for each style index
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, CellType>, is_1904: bool) -> Vec<CellType> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect()
}

/// Normalizes a relationship target to a path inside the archive
///
/// Targets are relative to `xl/` unless absolute.
///
/// # Arguments
/// * `path` - Target as written in the relationships file
///
/// # Returns
/// Path suitable for opening the entry in the zip archive
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        stripped.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}
