//! Repairs charts after the table they were built from changes.
//!
//! Charts remember their columns by header name. When a table is replaced the
//! names are resolved again against the new header; whatever no longer exists
//! is dropped. The repair is best effort and never fails.
use crate::chart::chart_rows;
use crate::grid::CellValue;
use crate::report::model::Grafica;
use tracing::{debug, warn};

/// Outcome of a recalculation pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecalculationReport {
    /// Indices (in the chart list) of charts whose data was rebuilt
    pub updated: Vec<usize>,
    /// Charts left untouched because none of their columns resolved
    pub stale: Vec<usize>,
    /// Human-readable notes about dropped columns and stale charts
    pub warnings: Vec<String>,
}

/// Columns of one chart that the new header does not contain.
#[derive(Clone, Debug, PartialEq)]
pub struct UnresolvedColumns {
    pub chart_index: usize,
    pub title: String,
    pub columns: Vec<String>,
}

fn header_names(table: &[Vec<CellValue>]) -> Vec<String> {
    table
        .first()
        .map(|header| header.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default()
}

/// Rebuilds every chart of `graficas` that points at record `excel_index`
/// from `table` (header row first).
pub fn recalculate_dependent_charts(
    graficas: &mut [Grafica],
    excel_index: usize,
    table: &[Vec<CellValue>],
) -> RecalculationReport {
    let header = header_names(table);
    let mut report = RecalculationReport::default();
    for (chart_index, grafica) in graficas.iter_mut().enumerate() {
        if grafica.excel_index != excel_index {
            continue;
        }

        let mut resolved = Vec::<(String, usize)>::new();
        for name in &grafica.columnas {
            match header.iter().position(|candidate| candidate == name) {
                Some(col) => resolved.push((name.to_owned(), col)),
                None => {
                    warn!(chart = chart_index, column = %name, "Chart column not found in new header");
                    report.warnings.push(format!(
                        "La columna '{}' ya no existe en la tabla; se eliminó de la gráfica '{}'",
                        name,
                        grafica.display_title()
                    ));
                }
            }
        }

        if resolved.is_empty() {
            warn!(chart = chart_index, "No chart column resolved, keeping previous data");
            report.warnings.push(format!(
                "La gráfica '{}' conserva sus datos anteriores: ninguna columna coincide con la nueva tabla",
                grafica.display_title()
            ));
            report.stale.push(chart_index);
            continue;
        }

        grafica.datos = chart_rows(table.get(1..).unwrap_or_default(), &resolved);
        grafica.columnas = resolved.into_iter().map(|(name, _)| name).collect();
        debug!(chart = chart_index, rows = grafica.datos.len(), "Chart recalculated");
        report.updated.push(chart_index);
    }
    report
}

/// Lists, ahead of a replacement, the chart columns the new header would lose.
pub fn preview_unresolved_columns(
    graficas: &[Grafica],
    excel_index: usize,
    new_header: &[CellValue],
) -> Vec<UnresolvedColumns> {
    let header: Vec<String> = new_header.iter().map(|cell| cell.to_string()).collect();
    graficas
        .iter()
        .enumerate()
        .filter(|(_, grafica)| grafica.excel_index == excel_index)
        .filter_map(|(chart_index, grafica)| {
            let columns: Vec<String> = grafica
                .columnas
                .iter()
                .filter(|name| !header.contains(name))
                .cloned()
                .collect();
            (!columns.is_empty()).then(|| UnresolvedColumns {
                chart_index,
                title: grafica.display_title().to_owned(),
                columns,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartKind;
    use crate::grid::text_grid;
    use serde_json::Value;

    fn chart(excel_index: usize, columnas: &[&str]) -> Grafica {
        Grafica {
            tipo: ChartKind::Line,
            datos: Vec::new(),
            columnas: columnas.iter().map(|name| name.to_string()).collect(),
            excel_index,
            nombre_excel: "ventas.xlsx".to_owned(),
            titulo_personalizado: None,
        }
    }

    #[test]
    fn renamed_column_is_dropped_and_label_kept() {
        let table = text_grid(&[&["Mes", "Ingresos"], &["Enero", "100"], &["Febrero", "200"]]);
        let mut graficas = vec![chart(0, &["Mes", "Ventas"]), chart(0, &["Mes"])];

        let report = recalculate_dependent_charts(&mut graficas, 0, &table);

        assert_eq!(report.updated, vec![0, 1]);
        assert!(report.stale.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Ventas"));
        assert_eq!(graficas[0].columnas, vec!["Mes".to_owned()]);
        assert_eq!(graficas[1].columnas, vec!["Mes".to_owned()]);
        // No value column left, so no row carries a number
        assert!(graficas[0].datos.is_empty());
    }

    #[test]
    fn rows_are_rebuilt_from_new_table() {
        let table = text_grid(&[
            &["Mes", "Ventas", "Gastos"],
            &["Enero", "1,200", ""],
            &["Febrero", "n/a", "-"],
            &["Marzo", "", "30.5"],
        ]);
        let mut graficas = vec![chart(0, &["Mes", "Gastos", "Ventas"]), chart(1, &["Otro"])];

        let report = recalculate_dependent_charts(&mut graficas, 0, &table);

        assert_eq!(report.updated, vec![0]);
        assert!(report.warnings.is_empty());
        let datos = &graficas[0].datos;
        assert_eq!(datos.len(), 2);
        assert_eq!(datos[0]["Mes"], Value::from("Enero"));
        assert_eq!(datos[0]["Ventas"], Value::from(1200.0));
        assert_eq!(datos[0]["Gastos"], Value::Null);
        assert_eq!(datos[1]["Mes"], Value::from("Marzo"));
        assert_eq!(datos[1]["Gastos"], Value::from(30.5));
        // Charts of other records are untouched
        assert_eq!(graficas[1].columnas, vec!["Otro".to_owned()]);
    }

    #[test]
    fn unresolvable_chart_keeps_stale_data() {
        let mut original = chart(0, &["Zona", "Total"]);
        original.datos.push(serde_json::from_str(r#"{"Zona": "Norte", "Total": 4}"#).unwrap());
        let mut graficas = vec![original.clone()];

        let report = recalculate_dependent_charts(&mut graficas, 0, &text_grid(&[&["Mes", "Ingresos"], &["Enero", "1"]]));

        assert_eq!(report.stale, vec![0]);
        assert!(report.updated.is_empty());
        assert_eq!(report.warnings.len(), 3);
        assert_eq!(graficas[0], original);
    }

    #[test]
    fn empty_table_leaves_every_chart_stale() {
        let mut graficas = vec![chart(0, &["Mes", "Ventas"])];
        let report = recalculate_dependent_charts(&mut graficas, 0, &[]);
        assert_eq!(report.stale, vec![0]);
    }

    #[test]
    fn preview_lists_missing_columns() {
        let graficas = vec![chart(0, &["Mes", "Ventas"]), chart(0, &["Mes"]), chart(2, &["Ventas"])];
        let header = text_grid(&[&["Mes", "Ingresos"]]).remove(0);

        let unresolved = preview_unresolved_columns(&graficas, 0, &header);

        assert_eq!(unresolved, vec![UnresolvedColumns {
            chart_index: 0,
            title: "ventas.xlsx".to_owned(),
            columns: vec!["Ventas".to_owned()],
        }]);
    }
}
