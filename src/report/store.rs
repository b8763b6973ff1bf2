//! The live report tree with change notification and persistence.
//!
//! Every mutation replaces the whole tree, notifies subscribers with the new
//! snapshot and then persists it. A failed save is reported to the caller but
//! the in-memory tree keeps the new state.
use crate::error::{InformeError, ResultMessage, ResultOptionChain};
use crate::report::document::ReportDocument;
use crate::report::model::{initial_structure, migrate_level_names, Planta, SubNivel};
use crate::report::storage::ReportStorage;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not determine the application data directory")]
    NoDataDirectory,

    #[error("Element not found: {0}")]
    NotFound(String),
}

type Listener = Box<dyn Fn(&[Planta])>;

pub struct ReportStore<S: ReportStorage> {
    storage: S,
    plantas: Vec<Planta>,
    listeners: Vec<Listener>,
}

impl<S: ReportStorage> ReportStore<S> {
    /// Loads the saved tree, or creates the initial structure when nothing is saved.
    /// Level titles are migrated to the canonical names either way.
    pub fn open(storage: S) -> Result<Self, InformeError> {
        let mut plantas = storage
            .load()
            .with_prefix("Load failed")
            .ok_none_else(|| Ok(Some(initial_structure())))?
            .unwrap_or_default();
        migrate_level_names(&mut plantas);
        Ok(Self {
            storage,
            plantas,
            listeners: Vec::new(),
        })
    }

    pub fn plantas(&self) -> &[Planta] {
        &self.plantas
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn subnivel(&self, planta: usize, nivel: usize, subnivel: usize) -> Option<&SubNivel> {
        self.plantas.get(planta)?.niveles.get(nivel)?.subniveles.get(subnivel)
    }

    /// Registers a listener called with the new tree after every replacement.
    pub fn subscribe(&mut self, listener: impl Fn(&[Planta]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Replaces the tree, broadcasts it and persists it.
    pub fn update_plantas(&mut self, plantas: Vec<Planta>) -> Result<(), InformeError> {
        self.plantas = plantas;
        for listener in &self.listeners {
            listener(&self.plantas);
        }
        self.storage.save(&self.plantas).with_prefix("Save failed").inspect_err(|e| {
            error!("{}", e);
        })
    }

    pub fn toggle_nivel(&mut self, planta: usize, nivel: usize) -> Result<(), InformeError> {
        let mut plantas = self.plantas.clone();
        let target = plantas
            .get_mut(planta)
            .and_then(|planta| planta.niveles.get_mut(nivel))
            .ok_or_else(|| StoreError::NotFound(format!("planta {planta}, nivel {nivel}")))?;
        target.collapsed = !target.collapsed;
        self.update_plantas(plantas)
    }

    pub fn update_subnivel(
        &mut self,
        planta: usize,
        nivel: usize,
        subnivel: usize,
        value: SubNivel,
    ) -> Result<(), InformeError> {
        let mut plantas = self.plantas.clone();
        let target = plantas
            .get_mut(planta)
            .and_then(|planta| planta.niveles.get_mut(nivel))
            .and_then(|nivel| nivel.subniveles.get_mut(subnivel))
            .ok_or_else(|| StoreError::NotFound(format!("planta {planta}, nivel {nivel}, subnivel {subnivel}")))?;
        *target = value;
        self.update_plantas(plantas)
    }

    /// Sets the custom display name; a blank name restores the default one.
    pub fn rename_planta(&mut self, planta: usize, name: &str) -> Result<(), InformeError> {
        let mut plantas = self.plantas.clone();
        let target = plantas
            .get_mut(planta)
            .ok_or_else(|| StoreError::NotFound(format!("planta {planta}")))?;
        let name = name.trim();
        target.nombre_personalizado = (!name.is_empty()).then(|| name.to_owned());
        self.update_plantas(plantas)
    }

    pub fn export_document(&self) -> ReportDocument {
        ReportDocument::new(self.plantas.clone())
    }

    pub fn export_configuration(&self, path: &Path) -> Result<(), InformeError> {
        let json = self.export_document().to_json()?;
        fs::write(path, json).map_err(InformeError::from).with_prefix("Export failed")?;
        info!(path = %path.display(), "Configuration exported");
        Ok(())
    }

    /// Replaces the whole tree with the imported one.
    pub fn import_configuration(&mut self, path: &Path) -> Result<(), InformeError> {
        let plantas = read_configuration(path)?;
        self.update_plantas(plantas)
    }

    /// Appends imported content into the sub-levels at matching positions.
    /// Positions that do not exist in the current tree are ignored.
    pub fn import_and_merge(&mut self, path: &Path) -> Result<(), InformeError> {
        let imported = read_configuration(path)?;
        let mut plantas = self.plantas.clone();
        for (planta, imported_planta) in plantas.iter_mut().zip(imported) {
            for (nivel, imported_nivel) in planta.niveles.iter_mut().zip(imported_planta.niveles) {
                for (subnivel, imported_subnivel) in nivel.subniveles.iter_mut().zip(imported_nivel.subniveles) {
                    subnivel.append(imported_subnivel);
                }
            }
        }
        self.update_plantas(plantas)
    }
}

fn read_configuration(path: &Path) -> Result<Vec<Planta>, InformeError> {
    let text = fs::read_to_string(path)?;
    let mut plantas = ReportDocument::parse(&text)
        .with_prefix("Error al procesar el archivo")?
        .plantas;
    migrate_level_names(&mut plantas);
    info!(path = %path.display(), plantas = plantas.len(), "Configuration read");
    Ok(plantas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::{ArchivoExcel, Imagen, TarjetaTexto};
    use crate::report::storage::{FileStorage, MemoryStorage};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn opens_with_initial_structure() -> Result<(), InformeError> {
        let store = ReportStore::open(MemoryStorage::new())?;
        assert_eq!(store.plantas().len(), 4);
        assert_eq!(store.subnivel(3, 4, 4).map(|subnivel| subnivel.id.as_str()), Some("5.5"));
        assert!(store.subnivel(4, 0, 0).is_none());
        Ok(())
    }

    #[test]
    fn opens_saved_tree_and_migrates_titles() -> Result<(), InformeError> {
        let mut plantas = initial_structure();
        plantas[0].niveles[1].titulo = "Capacitacion (viejo)".to_owned();
        let store = ReportStore::open(MemoryStorage::with_plantas(plantas))?;
        assert_eq!(store.plantas()[0].niveles[1].titulo, "Capacitación");
        Ok(())
    }

    #[test]
    fn load_failure_is_reported() -> Result<(), InformeError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("informes.json");
        fs::write(&path, "[{")?;
        let error = ReportStore::open(FileStorage::new(path)).err().unwrap();
        assert!(error.to_string().starts_with("Load failed: "));
        Ok(())
    }

    #[test]
    fn updates_broadcast_and_persist() -> Result<(), InformeError> {
        let mut store = ReportStore::open(MemoryStorage::new())?;
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        store.subscribe(move |plantas| {
            assert_eq!(plantas.len(), 4);
            seen.set(seen.get() + 1);
        });

        store.toggle_nivel(0, 0)?;
        assert!(!store.plantas()[0].niveles[0].collapsed);
        store.rename_planta(2, "  Planta Norte ")?;
        assert_eq!(store.plantas()[2].display_name(), "Planta Norte");
        store.rename_planta(2, "")?;
        assert_eq!(store.plantas()[2].display_name(), "Planta 3");

        let mut subnivel = SubNivel::new("1.2");
        subnivel.titulo = "Extintores".to_owned();
        store.update_subnivel(0, 0, 1, subnivel.clone())?;
        assert_eq!(store.subnivel(0, 0, 1), Some(&subnivel));

        assert_eq!(calls.get(), 4);
        assert_eq!(store.storage().load()?.as_deref(), Some(store.plantas()));
        Ok(())
    }

    #[test]
    fn bad_indices_leave_state_untouched() -> Result<(), InformeError> {
        let mut store = ReportStore::open(MemoryStorage::new())?;
        assert!(matches!(store.toggle_nivel(9, 0), Err(InformeError::StoreError(StoreError::NotFound(_)))));
        assert!(store.update_subnivel(0, 0, 9, SubNivel::default()).is_err());
        assert!(store.rename_planta(4, "x").is_err());
        assert!(store.storage().load()?.is_none());
        Ok(())
    }

    struct FailingStorage;

    impl ReportStorage for FailingStorage {
        fn load(&self) -> Result<Option<Vec<Planta>>, InformeError> {
            Ok(None)
        }

        fn save(&self, _plantas: &[Planta]) -> Result<(), InformeError> {
            Err(std::io::Error::other("disk full"))?
        }
    }

    #[test]
    fn save_failure_keeps_live_state() -> Result<(), InformeError> {
        let mut store = ReportStore::open(FailingStorage)?;
        let error = store.toggle_nivel(1, 1).unwrap_err();
        assert_eq!(error.to_string(), "Save failed: disk full");
        assert!(!store.plantas()[1].niveles[1].collapsed);
        Ok(())
    }

    #[test]
    fn export_then_import_replaces_tree() -> Result<(), InformeError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("configuracion.json");

        let mut source = ReportStore::open(MemoryStorage::new())?;
        let mut subnivel = SubNivel::new("1.1");
        subnivel.tarjetas_texto.push(TarjetaTexto { titulo: "Hallazgo".to_owned(), contenido: "Sin casco".to_owned() });
        source.update_subnivel(1, 0, 0, subnivel)?;
        source.export_configuration(&path)?;

        let mut target = ReportStore::open(MemoryStorage::new())?;
        target.import_configuration(&path)?;
        assert_eq!(target.plantas(), source.plantas());
        Ok(())
    }

    #[test]
    fn invalid_import_leaves_state_untouched() -> Result<(), InformeError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("configuracion.json");
        fs::write(&path, r#"{"plantas": []}"#)?;

        let mut store = ReportStore::open(MemoryStorage::new())?;
        let before = store.plantas().to_vec();
        let error = store.import_configuration(&path).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Error al procesar el archivo: El archivo no tiene el formato correcto de configuración"
        );
        assert!(store.import_and_merge(&directory.path().join("missing.json")).is_err());
        assert_eq!(store.plantas(), &before[..]);
        Ok(())
    }

    #[test]
    fn merge_appends_content() -> Result<(), InformeError> {
        let directory = tempfile::tempdir()?;
        let path = directory.path().join("configuracion.json");

        let mut imported = initial_structure();
        let extra = &mut imported[0].niveles[0].subniveles[0];
        extra.archivos_excel.push(ArchivoExcel { nombre: "importado.xlsx".to_owned(), ..ArchivoExcel::default() });
        extra.imagenes.push(Imagen { nombre: "foto".to_owned(), datos: String::new() });
        // Positions beyond the current tree are ignored
        imported.push(Planta { id: 5, nombre: "Planta 5".to_owned(), ..Planta::default() });
        fs::write(&path, ReportDocument::new(imported).to_json()?)?;

        let mut plantas = initial_structure();
        plantas[0].niveles[0].subniveles[0]
            .archivos_excel
            .push(ArchivoExcel { nombre: "actual.xlsx".to_owned(), ..ArchivoExcel::default() });
        let mut store = ReportStore::open(MemoryStorage::with_plantas(plantas))?;
        store.import_and_merge(&path)?;

        assert_eq!(store.plantas().len(), 4);
        let subnivel = store.subnivel(0, 0, 0).unwrap();
        let names: Vec<&str> = subnivel.archivos_excel.iter().map(|record| record.nombre.as_str()).collect();
        assert_eq!(names, vec!["actual.xlsx", "importado.xlsx"]);
        assert_eq!(subnivel.imagenes.len(), 1);
        Ok(())
    }
}
