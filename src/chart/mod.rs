//! # Charts
//!
//! Builds chart records from attached tables and turns stored records into
//! renderer-ready series. Chart data is stored as one record per table row,
//! keyed by column name: the first selected column is the label, the others
//! are numbers (or `null` when the cell is not numeric).
pub mod recalc;

use crate::error::InformeError;
use crate::grid::CellValue;
use crate::report::model::{ArchivoExcel, ChartRow, Grafica};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Series colors, cycled per dataset.
pub const PALETTE: [&str; 6] = [
    "rgb(59, 130, 246)",
    "rgb(16, 185, 129)",
    "rgb(245, 158, 11)",
    "rgb(239, 68, 68)",
    "rgb(139, 92, 246)",
    "rgb(236, 72, 153)",
];

/// Hex alpha appended to bar fill colors.
const BAR_ALPHA: &str = "80";
const LINE_TENSION: f64 = 0.4;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("At least 2 columns must be selected, got {0}")]
    NotEnoughColumns(usize),

    #[error("Column {0} does not exist in the table")]
    ColumnOutOfRange(usize),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Radar,
}

/// Chart-ready data: one label per row and one dataset per value column.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

/// Shapes table rows into chart records for the `(name, column index)` pairs.
///
/// Rows without a numeric value in any non-label column are discarded.
pub(crate) fn chart_rows(rows: &[Vec<CellValue>], columns: &[(String, usize)]) -> Vec<ChartRow> {
    let Some(((label_name, label_col), values)) = columns.split_first() else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let cell = |col: usize| row.get(col).cloned().unwrap_or_default();
            let mut record = ChartRow::new();
            record.insert(label_name.to_owned(), Value::String(cell(*label_col).to_string()));
            let mut has_number = false;
            for (name, col) in values {
                let value = match cell(*col).as_number() {
                    Some(number) => {
                        has_number = true;
                        Value::from(number)
                    }
                    None => Value::Null,
                };
                record.insert(name.to_owned(), value);
            }
            has_number.then_some(record)
        })
        .collect()
}

/// Builds a chart from the displayed table of `record`.
///
/// `columns` are header positions; the first one provides the labels.
pub fn build_chart(
    record: &ArchivoExcel,
    excel_index: usize,
    kind: ChartKind,
    columns: &[usize],
    title: Option<String>,
) -> Result<Grafica, InformeError> {
    if columns.len() < 2 {
        Err(ChartError::NotEnoughColumns(columns.len()))?
    }
    let header = record.header();
    let resolved = columns
        .iter()
        .map(|&col| {
            header
                .get(col)
                .map(|cell| (cell.to_string(), col))
                .ok_or(ChartError::ColumnOutOfRange(col))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let datos = chart_rows(record.datos.get(1..).unwrap_or_default(), &resolved);
    debug!(excel = %record.nombre, ?kind, rows = datos.len(), "Chart built");
    Ok(Grafica {
        tipo: kind,
        datos,
        columnas: resolved.into_iter().map(|(name, _)| name).collect(),
        excel_index,
        nombre_excel: record.nombre.to_owned(),
        titulo_personalizado: title.filter(|title| !title.trim().is_empty()),
    })
}

fn label_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.to_owned(),
        Some(other) => other.to_string(),
    }
}

fn dataset_value(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) if text.trim().is_empty() => Some(0.0),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        Some(Value::Bool(flag)) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    number.filter(|number| number.is_finite()).unwrap_or(0.0)
}

/// Converts a stored chart into labels and datasets; non-numeric values become 0.
pub fn chart_series(grafica: &Grafica) -> ChartSeries {
    if grafica.datos.is_empty() || grafica.columnas.len() < 2 {
        return ChartSeries::default();
    }
    let label_column = &grafica.columnas[0];
    let labels = grafica.datos.iter().map(|row| label_text(row.get(label_column))).collect();
    let datasets = grafica.columnas[1..]
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let color = PALETTE[index % PALETTE.len()];
            let is_line = grafica.tipo == ChartKind::Line;
            Dataset {
                label: column.to_owned(),
                data: grafica.datos.iter().map(|row| dataset_value(row.get(column))).collect(),
                background_color: match grafica.tipo {
                    ChartKind::Bar => format!("{color}{BAR_ALPHA}"),
                    _ => "transparent".to_owned(),
                },
                border_color: color.to_owned(),
                border_width: 2,
                fill: is_line.then_some(false),
                tension: is_line.then_some(LINE_TENSION),
            }
        })
        .collect();
    ChartSeries { labels, datasets }
}
