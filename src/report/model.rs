//! The report tree: plants, levels, sub-levels and the content attached to them.
//!
//! Field names follow the persisted JSON document (`archivosExcel`,
//! `excelIndex`, ...), so the types round-trip through files written by
//! earlier versions of the application.
use crate::chart::recalc::{recalculate_dependent_charts, RecalculationReport};
use crate::chart::ChartKind;
use crate::detection::LogicalTable;
use crate::grid::{CellValue, Grid};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical level titles, in level order.
pub const LEVEL_NAMES: [&str; 5] = [
    "Conceptos a evaluar",
    "Capacitación",
    "Condiciones y actos inseguros",
    "Productos quimicos cumplimiento NOM - 018",
    "Ergonomia y manos seguras",
];

pub const PLANT_COUNT: usize = 4;
pub const LEVEL_COUNT: usize = 5;
pub const SUBLEVEL_COUNT: usize = 5;

/// One chart row: the label column as a string, the value columns as numbers or null.
pub type ChartRow = Map<String, Value>;

/// A spreadsheet attached to a sub-level.
///
/// `datos` always holds the table that is displayed by default; when
/// detection found several tables, `tablas` lists all of them and `datos`
/// mirrors the first one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivoExcel {
    pub nombre: String,
    #[serde(default)]
    pub datos: Grid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tablas: Option<Vec<TablaDetectada>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablaDetectada {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(default)]
    pub datos: Grid,
    #[serde(default)]
    pub fila_inicio: usize,
    #[serde(default)]
    pub fila_fin: usize,
}

impl From<LogicalTable> for TablaDetectada {
    fn from(table: LogicalTable) -> Self {
        Self {
            id: table.id,
            titulo: table.title,
            datos: table.data,
            fila_inicio: table.start_row,
            fila_fin: table.end_row,
        }
    }
}

impl ArchivoExcel {
    /// Builds the record for the detected tables: single-table format for one
    /// table, multi-table format for several, `None` for none.
    pub fn from_tables(nombre: &str, tables: Vec<LogicalTable>) -> Option<Self> {
        let mut tablas: Vec<TablaDetectada> = tables.into_iter().map(TablaDetectada::from).collect();
        match tablas.len() {
            0 => None,
            1 => Some(Self {
                nombre: nombre.to_owned(),
                datos: tablas.remove(0).datos,
                tablas: None,
            }),
            _ => Some(Self {
                nombre: nombre.to_owned(),
                datos: tablas[0].datos.clone(),
                tablas: Some(tablas),
            }),
        }
    }

    /// Number of tables held by the record.
    pub fn table_count(&self) -> usize {
        self.tablas.as_ref().map(Vec::len).unwrap_or(1)
    }

    /// Header row of the displayed table.
    pub fn header(&self) -> &[CellValue] {
        self.datos.first().map(Vec::as_slice).unwrap_or_default()
    }
}

/// An image stored inline as a `data:` URL.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Imagen {
    pub nombre: String,
    pub datos: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grafica {
    pub tipo: ChartKind,
    #[serde(default)]
    pub datos: Vec<ChartRow>,
    #[serde(default)]
    pub columnas: Vec<String>,
    /// Index of the source record in `archivosExcel`
    pub excel_index: usize,
    #[serde(default)]
    pub nombre_excel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo_personalizado: Option<String>,
}

impl Grafica {
    /// Custom title when set, otherwise the source spreadsheet name.
    pub fn display_title(&self) -> &str {
        self.titulo_personalizado
            .as_deref()
            .filter(|title| !title.trim().is_empty())
            .unwrap_or(&self.nombre_excel)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TarjetaTexto {
    pub titulo: String,
    #[serde(default)]
    pub contenido: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collage {
    pub nombre: String,
    #[serde(default)]
    pub imagenes: Vec<Imagen>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubNivel {
    pub id: String,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub archivos_excel: Vec<ArchivoExcel>,
    #[serde(default)]
    pub imagenes: Vec<Imagen>,
    #[serde(default)]
    pub graficas: Vec<Grafica>,
    #[serde(default)]
    pub tarjetas_texto: Vec<TarjetaTexto>,
    #[serde(default)]
    pub collages: Vec<Collage>,
}

/// What [`SubNivel::remove_table`] removed.
#[derive(Clone, Debug, PartialEq)]
pub enum Removal {
    /// One table of a multi-table record; the record stays.
    Table { remaining: usize },
    /// The whole record together with the charts built from it.
    Record { charts_removed: usize },
}

impl SubNivel {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            ..Self::default()
        }
    }

    /// True when nothing has been attached yet.
    pub fn is_empty(&self) -> bool {
        self.archivos_excel.is_empty()
            && self.imagenes.is_empty()
            && self.graficas.is_empty()
            && self.tarjetas_texto.is_empty()
            && self.collages.is_empty()
    }

    /// Removes one table from the record at `excel_index`.
    ///
    /// A multi-table record left with a single table collapses back to the
    /// single-table format. Removing from a single-table record drops the whole
    /// record and every chart built from it; later charts are re-indexed.
    /// Returns `None` when either index is out of range.
    pub fn remove_table(&mut self, excel_index: usize, table_index: usize) -> Option<Removal> {
        if self.archivos_excel.get(excel_index)?.table_count() < 2 {
            return (table_index == 0).then(|| Removal::Record {
                charts_removed: self.remove_excel(excel_index),
            });
        }

        let record = &mut self.archivos_excel[excel_index];
        let tablas = record.tablas.as_mut()?;
        if table_index >= tablas.len() {
            return None;
        }
        tablas.remove(table_index);
        let remaining = tablas.len();
        let first = tablas[0].datos.clone();
        if remaining == 1 {
            record.tablas = None;
        }
        if record.datos != first {
            record.datos = first.clone();
            recalculate_dependent_charts(&mut self.graficas, excel_index, &first);
        }
        Some(Removal::Table { remaining })
    }

    /// Removes a spreadsheet record and its charts, returning how many charts went with it.
    fn remove_excel(&mut self, excel_index: usize) -> usize {
        self.archivos_excel.remove(excel_index);
        let before = self.graficas.len();
        self.graficas.retain(|grafica| grafica.excel_index != excel_index);
        for grafica in self.graficas.iter_mut() {
            if grafica.excel_index > excel_index {
                grafica.excel_index -= 1;
            }
        }
        before - self.graficas.len()
    }

    /// Replaces the record at `index` and repairs the charts built from it.
    pub fn replace_excel(&mut self, index: usize, record: ArchivoExcel) -> Option<RecalculationReport> {
        let slot = self.archivos_excel.get_mut(index)?;
        *slot = record;
        let datos = slot.datos.clone();
        let nombre = slot.nombre.clone();
        for grafica in self.graficas.iter_mut().filter(|grafica| grafica.excel_index == index) {
            grafica.nombre_excel = nombre.clone();
        }
        Some(recalculate_dependent_charts(&mut self.graficas, index, &datos))
    }

    /// Appends every attachment of `other`, re-indexing its charts past the existing records.
    pub fn append(&mut self, other: SubNivel) {
        let offset = self.archivos_excel.len();
        self.archivos_excel.extend(other.archivos_excel);
        self.imagenes.extend(other.imagenes);
        self.graficas.extend(other.graficas.into_iter().map(|mut grafica| {
            grafica.excel_index += offset;
            grafica
        }));
        self.tarjetas_texto.extend(other.tarjetas_texto);
        self.collages.extend(other.collages);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nivel {
    pub id: String,
    #[serde(default)]
    pub titulo: String,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default)]
    pub subniveles: Vec<SubNivel>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planta {
    pub id: u32,
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre_personalizado: Option<String>,
    #[serde(default)]
    pub niveles: Vec<Nivel>,
}

impl Planta {
    pub fn display_name(&self) -> &str {
        self.nombre_personalizado
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.nombre)
    }
}

/// Four plants, five collapsed levels each, five empty sub-levels per level.
pub fn initial_structure() -> Vec<Planta> {
    (1..=PLANT_COUNT)
        .map(|p| Planta {
            id: p as u32,
            nombre: format!("Planta {p}"),
            nombre_personalizado: None,
            niveles: (1..=LEVEL_COUNT)
                .map(|n| Nivel {
                    id: n.to_string(),
                    titulo: level_name(n - 1, ""),
                    collapsed: true,
                    subniveles: (1..=SUBLEVEL_COUNT).map(|s| SubNivel::new(&format!("{n}.{s}"))).collect(),
                })
                .collect(),
        })
        .collect()
}

/// Rewrites level titles to the canonical names.
pub fn migrate_level_names(plantas: &mut [Planta]) {
    for planta in plantas.iter_mut() {
        for (index, nivel) in planta.niveles.iter_mut().enumerate() {
            nivel.titulo = level_name(index, &nivel.titulo);
        }
    }
}

/// Canonical name for the level at `index`, else `current`, else `Nivel {n}`.
fn level_name(index: usize, current: &str) -> String {
    match LEVEL_NAMES.get(index) {
        Some(name) => (*name).to_owned(),
        None if !current.is_empty() => current.to_owned(),
        None => format!("Nivel {}", index + 1),
    }
}

/// Every sub-level of every plant, in tree order.
pub fn subniveles(plantas: &[Planta]) -> impl Iterator<Item = &SubNivel> {
    plantas
        .iter()
        .flat_map(|planta| planta.niveles.iter())
        .flat_map(|nivel| nivel.subniveles.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::text_grid;

    fn chart(excel_index: usize, columnas: &[&str]) -> Grafica {
        Grafica {
            tipo: ChartKind::Bar,
            datos: Vec::new(),
            columnas: columnas.iter().map(|name| name.to_string()).collect(),
            excel_index,
            nombre_excel: format!("excel {excel_index}"),
            titulo_personalizado: None,
        }
    }

    fn tabla(id: &str, header: &str) -> TablaDetectada {
        TablaDetectada {
            id: id.to_owned(),
            titulo: None,
            datos: text_grid(&[&[header, "Total"], &["a", "1"]]),
            fila_inicio: 0,
            fila_fin: 1,
        }
    }

    #[test]
    fn initial_structure_shape() {
        let plantas = initial_structure();
        assert_eq!(plantas.len(), 4);
        assert_eq!(plantas[3].nombre, "Planta 4");
        assert_eq!(plantas[0].niveles.len(), 5);
        assert_eq!(plantas[0].niveles[3].titulo, "Productos quimicos cumplimiento NOM - 018");
        assert!(plantas[0].niveles.iter().all(|nivel| nivel.collapsed));
        assert_eq!(plantas[0].niveles[4].subniveles[2].id, "5.3");
        assert_eq!(subniveles(&plantas).count(), 100);
        assert!(subniveles(&plantas).all(SubNivel::is_empty));
    }

    #[test]
    fn migrates_level_names() {
        let mut plantas = vec![Planta {
            id: 1,
            nombre: "Planta 1".to_owned(),
            nombre_personalizado: None,
            niveles: (0..7)
                .map(|index| Nivel {
                    id: index.to_string(),
                    titulo: if index == 5 { "Extra".to_owned() } else { String::new() },
                    ..Nivel::default()
                })
                .collect(),
        }];
        migrate_level_names(&mut plantas);
        let titles: Vec<&str> = plantas[0].niveles.iter().map(|nivel| nivel.titulo.as_str()).collect();
        assert_eq!(titles[0], "Conceptos a evaluar");
        assert_eq!(titles[1], "Capacitación");
        assert_eq!(titles[5], "Extra");
        assert_eq!(titles[6], "Nivel 7");
    }

    #[test]
    fn display_names() {
        let mut planta = Planta { nombre: "Planta 2".to_owned(), ..Planta::default() };
        assert_eq!(planta.display_name(), "Planta 2");
        planta.nombre_personalizado = Some("Monterrey".to_owned());
        assert_eq!(planta.display_name(), "Monterrey");
        planta.nombre_personalizado = Some("  ".to_owned());
        assert_eq!(planta.display_name(), "Planta 2");
    }

    #[test]
    fn record_from_tables() {
        let single = LogicalTable::new(1, "Tabla 1".to_owned(), text_grid(&[&["A", "B"], &["1", "2"]]), 0, 1);
        let record = ArchivoExcel::from_tables("uno.xlsx", vec![single.clone()]).unwrap();
        assert!(record.tablas.is_none());
        assert_eq!(record.datos, single.data);
        assert_eq!(record.table_count(), 1);

        let second = LogicalTable::new(2, "Tabla 2".to_owned(), text_grid(&[&["C", "D"], &["3", "4"]]), 4, 5);
        let record = ArchivoExcel::from_tables("dos.xlsx", vec![single.clone(), second]).unwrap();
        assert_eq!(record.table_count(), 2);
        assert_eq!(record.datos, single.data);
        assert_eq!(record.tablas.as_ref().unwrap()[1].fila_inicio, 4);

        assert!(ArchivoExcel::from_tables("nada.xlsx", Vec::new()).is_none());
    }

    #[test]
    fn removing_a_table_collapses_to_single_format() {
        let mut subnivel = SubNivel::new("1.1");
        subnivel.archivos_excel.push(ArchivoExcel {
            nombre: "multi.xlsx".to_owned(),
            datos: tabla("tabla_1", "Zona").datos,
            tablas: Some(vec![tabla("tabla_1", "Zona"), tabla("tabla_2", "Turno")]),
        });

        assert_eq!(subnivel.remove_table(0, 5), None);
        assert_eq!(subnivel.remove_table(0, 0), Some(Removal::Table { remaining: 1 }));
        let record = &subnivel.archivos_excel[0];
        assert!(record.tablas.is_none());
        assert_eq!(record.header()[0], CellValue::text("Turno"));
    }

    #[test]
    fn removing_a_single_table_drops_record_and_charts() {
        let mut subnivel = SubNivel::new("1.1");
        subnivel.archivos_excel.push(ArchivoExcel { nombre: "a.xlsx".to_owned(), ..ArchivoExcel::default() });
        subnivel.archivos_excel.push(ArchivoExcel { nombre: "b.xlsx".to_owned(), ..ArchivoExcel::default() });
        subnivel.graficas = vec![chart(0, &["Mes"]), chart(1, &["Mes"]), chart(0, &["Mes"])];

        assert_eq!(subnivel.remove_table(0, 1), None);
        assert_eq!(subnivel.remove_table(0, 0), Some(Removal::Record { charts_removed: 2 }));
        assert_eq!(subnivel.archivos_excel.len(), 1);
        assert_eq!(subnivel.archivos_excel[0].nombre, "b.xlsx");
        assert_eq!(subnivel.graficas.len(), 1);
        assert_eq!(subnivel.graficas[0].excel_index, 0);
        assert_eq!(subnivel.remove_table(3, 0), None);
    }

    #[test]
    fn replacing_a_record_repairs_charts() {
        let mut subnivel = SubNivel::new("2.1");
        subnivel.archivos_excel.push(ArchivoExcel {
            nombre: "v1.xlsx".to_owned(),
            datos: text_grid(&[&["Mes", "Ventas"], &["Enero", "10"]]),
            tablas: None,
        });
        subnivel.graficas.push(chart(0, &["Mes", "Ventas"]));

        let report = subnivel
            .replace_excel(0, ArchivoExcel {
                nombre: "v2.xlsx".to_owned(),
                datos: text_grid(&[&["Mes", "Ventas"], &["Enero", "25"], &["Febrero", "x"]]),
                tablas: None,
            })
            .unwrap();
        assert!(report.warnings.is_empty());
        let grafica = &subnivel.graficas[0];
        assert_eq!(grafica.nombre_excel, "v2.xlsx");
        assert_eq!(grafica.datos.len(), 1);
        assert_eq!(grafica.datos[0]["Ventas"], Value::from(25.0));
        assert!(subnivel.replace_excel(4, ArchivoExcel::default()).is_none());
    }

    #[test]
    fn appending_reindexes_charts() {
        let mut current = SubNivel::new("1.1");
        current.archivos_excel.push(ArchivoExcel::default());
        let mut imported = SubNivel::new("1.1");
        imported.archivos_excel.push(ArchivoExcel::default());
        imported.graficas.push(chart(0, &["Mes", "Ventas"]));
        imported.tarjetas_texto.push(TarjetaTexto { titulo: "Nota".to_owned(), contenido: String::new() });

        current.append(imported);
        assert_eq!(current.archivos_excel.len(), 2);
        assert_eq!(current.graficas[0].excel_index, 1);
        assert_eq!(current.tarjetas_texto.len(), 1);
    }

    #[test]
    fn deserializes_sparse_json() {
        let json = r#"{"id": 3, "nombre": "Planta 3", "niveles": [
            {"id": "1", "titulo": "x", "subniveles": [
                {"id": "1.1", "archivosExcel": [{"nombre": "a.xlsx", "datos": [["Mes", "Ventas"], ["Enero", 10], [null, true]]}],
                 "graficas": [{"tipo": "line", "datos": [{"Mes": "Enero", "Ventas": 10}], "columnas": ["Mes", "Ventas"], "excelIndex": 0, "nombreExcel": "a.xlsx"}]}
            ]}
        ]}"#;
        let planta: Planta = serde_json::from_str(json).unwrap();
        let subnivel = &planta.niveles[0].subniveles[0];
        assert!(!planta.niveles[0].collapsed);
        assert_eq!(subnivel.archivos_excel[0].datos[1][1], CellValue::Number(10.0));
        assert_eq!(subnivel.archivos_excel[0].datos[2], vec![CellValue::Empty, CellValue::text("true")]);
        assert_eq!(subnivel.graficas[0].tipo, ChartKind::Line);
        assert_eq!(subnivel.graficas[0].display_title(), "a.xlsx");
        assert!(subnivel.imagenes.is_empty());

        let json = serde_json::to_value(subnivel).unwrap();
        assert!(json.get("tarjetasTexto").is_some());
        assert!(json["archivosExcel"][0].get("tablas").is_none());
        assert_eq!(json["graficas"][0]["excelIndex"], 0);
    }
}
