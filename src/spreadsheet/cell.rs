use crate::error::InformeError;
use crate::grid::CellValue;
use chrono::Duration;
use chrono::NaiveDate;
use iso8601_duration::Duration as IsoDuration;

/// How the raw text of a cell must be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    Boolean,
    Number,
    /// Serial date/time numbers, 1900 or 1904 epoch
    DateTime { is_1904: bool },
    Date { is_1904: bool },
    Time,
    /// ISO 8601 date or date-time text
    IsoDateTime,
    /// ISO 8601 duration text (ODS time values)
    IsoDuration,
    InlineString,
    /// Index into the shared string table
    SharedString,
    Error,
}

impl CellType {
    /// Cell type implied by a built-in Excel number format id.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::DateTime { is_1904 }),
            "14" | "15" | "16" | "17" => Some(Self::Date { is_1904 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::Time),
            _ => None,
        }
    }

    /// Cell type implied by a custom number format code.
    ///
    /// Quoted literals, escaped characters and bracketed sections (colors,
    /// conditions) are ignored while scanning for date and time tokens.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::DateTime { is_1904 },
            (true, false) => Self::Date { is_1904 },
            (false, true) => Self::Time,
            (false, false) => Self::Number,
        }
    }
}

/// A raw cell read from a worksheet: position, type and undecoded text.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    pub(crate) row: usize,
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    /// Decodes the raw text into a grid value.
    ///
    /// Numbers stay numeric, dates and times become ISO text, booleans become
    /// `true`/`false` and error cells keep their `#...` code.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<CellValue, InformeError> {
        let value = match self.kind {
            CellType::Empty => CellValue::Empty,
            CellType::Boolean => {
                CellValue::text(if self.value == "1" || self.value == "true" { "true" } else { "false" })
            }
            CellType::Number => match self.value.trim().parse::<f64>() {
                Ok(number) => CellValue::Number(number),
                Err(_) => CellValue::text(self.value.to_owned()),
            },
            CellType::DateTime { is_1904 } => CellValue::Text(to_datetime_string(&self.value, is_1904)?),
            CellType::Date { is_1904 } => CellValue::Text(to_date_string(&self.value, is_1904)?),
            CellType::Time => CellValue::Text(to_time_string(&self.value)?),
            CellType::IsoDateTime => CellValue::Text(self.value.replace('T', " ")),
            CellType::IsoDuration => CellValue::Text(to_duration_string(&self.value)),
            CellType::SharedString => {
                let index = self.value.trim().parse::<usize>()?;
                shared_strings
                    .get(index)
                    .map(|text| CellValue::from(text.as_str()))
                    .unwrap_or_default()
            }
            CellType::InlineString | CellType::Error => CellValue::from(self.value.as_str()),
        };
        Ok(value)
    }
}

/// Converts an Excel serial day number to an ISO date string.
/// Serial 60 is the fictitious 1900-02-29 kept for Lotus 1-2-3 compatibility.
fn to_date_string(value: &str, is_1904: bool) -> Result<String, InformeError> {
    let days = value.trim().parse::<f64>()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal") + Duration::days(days + offset);
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Converts the fractional part of an Excel serial number to `HH:MM:SS`.
fn to_time_string(value: &str) -> Result<String, InformeError> {
    let factor = value.trim().parse::<f64>()?.fract();
    let mut seconds = (factor * 86_400f64).round() as i64;
    let hours = seconds / 3600;
    seconds %= 3600;
    let minutes = seconds / 60;
    seconds %= 60;
    Ok(format!("{hours:02}:{minutes:02}:{seconds:02}"))
}

fn to_datetime_string(value: &str, is_1904: bool) -> Result<String, InformeError> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Ok(format!("{date} {time}"))
}

/// Renders an ISO 8601 duration (`PT12H30M05S`) as `HH:MM:SS`.
fn to_duration_string(value: &str) -> String {
    match value.parse::<IsoDuration>() {
        Ok(duration) => format!(
            "{:02}:{:02}:{:02}",
            duration.day as u64 * 24 + duration.hour as u64,
            duration.minute as u64,
            duration.second as u64,
        ),
        Err(_) => value.to_owned(),
    }
}
