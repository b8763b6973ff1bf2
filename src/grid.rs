//! Raw cell grids as produced by the spreadsheet readers and consumed by table detection.
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display};

/// Row-major 2D cell grid. Rows may be ragged.
pub type Grid = Vec<Vec<CellValue>>;

/// A single cell value read from a spreadsheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Shorthand for building text cells in code and tests.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Empty cells are absent values and strings that trim to nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Returns the numeric value when the cell looks like a number.
    ///
    /// Text is parsed after removing thousands-separator commas; NaN and
    /// infinities are rejected.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Empty => return None,
            Self::Number(value) => *value,
            Self::Text(text) => text.trim().replace(',', "").parse::<f64>().ok()?,
        };
        Some(value).filter(|value| value.is_finite())
    }

    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    /// Trims surrounding whitespace from text and collapses blank text to `Empty`.
    pub fn cleaned(&self) -> Self {
        match self {
            Self::Text(text) if text.trim().is_empty() => Self::Empty,
            Self::Text(text) => Self::Text(text.trim().to_owned()),
            other => other.clone(),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(text) => write!(f, "{}", text),
            Self::Number(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_owned())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_str(""),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Number(value) => serializer.serialize_f64(*value),
        }
    }
}

struct CellValueVisitor;

impl<'de> Visitor<'de> for CellValueVisitor {
    type Value = CellValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, a number, a boolean or null")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<CellValue, E> {
        Ok(CellValue::Text(value.to_string()))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<CellValue, E> {
        Ok(CellValue::Number(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<CellValue, E> {
        Ok(CellValue::Number(value as f64))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<CellValue, E> {
        Ok(CellValue::Number(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<CellValue, E> {
        Ok(CellValue::from(value))
    }

    fn visit_unit<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Empty)
    }

    fn visit_none<E: de::Error>(self) -> Result<CellValue, E> {
        Ok(CellValue::Empty)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellValueVisitor)
    }
}

/// Logical width of a grid: the length of its longest row.
pub fn grid_width(grid: &[Vec<CellValue>]) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

/// True when every cell of the row is empty (ragged rows count missing cells as empty).
pub fn is_blank_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}

/// Builds a text grid from string literals; empty strings become empty cells.
pub fn text_grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|row| row.iter().map(|value| CellValue::from(*value)).collect())
        .collect()
}
