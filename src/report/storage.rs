//! Where the live report tree is persisted between sessions.
use crate::error::InformeError;
use crate::report::model::Planta;
use crate::report::store::StoreError;
use directories_next::ProjectDirs;
use std::cell::RefCell;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "Radar";
const APPLICATION: &str = "InformePlantas";
const DATA_FILE: &str = "informes.json";

pub trait ReportStorage {
    /// Returns the saved tree, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<Planta>>, InformeError>;

    fn save(&self, plantas: &[Planta]) -> Result<(), InformeError>;
}

/// Stores the tree as pretty-printed JSON in a single file.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `informes.json` inside the per-user application data directory.
    pub fn default_location() -> Result<Self, InformeError> {
        let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or(StoreError::NoDataDirectory)?;
        Ok(Self::new(dirs.data_dir().join(DATA_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportStorage for FileStorage {
    fn load(&self) -> Result<Option<Vec<Planta>>, InformeError> {
        match fs::File::open(&self.path) {
            Ok(file) => {
                let plantas = serde_json::from_reader(BufReader::new(file))?;
                debug!(path = %self.path.display(), "Report loaded");
                Ok(Some(plantas))
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No saved report, starting fresh");
                Ok(None)
            }
            Err(error) => Err(error)?,
        }
    }

    fn save(&self, plantas: &[Planta]) -> Result<(), InformeError> {
        write_replacing(&self.path, |writer| Ok(serde_json::to_writer_pretty(writer, plantas)?))?;
        debug!(path = %self.path.display(), "Report saved");
        Ok(())
    }
}

/// Writes into a temporary file next to `path` and renames it over `path`.
///
/// The previous file stays intact unless every byte was written and flushed.
fn write_replacing<F>(path: &Path, write: F) -> Result<(), InformeError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<(), InformeError>,
{
    let directory = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}

/// Keeps the saved tree in memory; for hosts without a filesystem and for tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    saved: RefCell<Option<Vec<Planta>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plantas(plantas: Vec<Planta>) -> Self {
        Self {
            saved: RefCell::new(Some(plantas)),
        }
    }
}

impl ReportStorage for MemoryStorage {
    fn load(&self) -> Result<Option<Vec<Planta>>, InformeError> {
        Ok(self.saved.borrow().clone())
    }

    fn save(&self, plantas: &[Planta]) -> Result<(), InformeError> {
        *self.saved.borrow_mut() = Some(plantas.to_vec());
        Ok(())
    }
}
