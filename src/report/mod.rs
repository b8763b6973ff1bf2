//! # Report
//!
//! The plant → level → sub-level tree, the content attached to sub-levels,
//! its persistence and the exported configuration document.
pub mod attach;
pub mod document;
pub mod model;
pub mod storage;
pub mod store;

pub use attach::{add_collage, add_text_card, attach_spreadsheet, read_spreadsheet_file, AttachError};
pub use document::{suggested_file_name, DocumentError, Metadatos, ReportDocument};
pub use model::{ArchivoExcel, Collage, Grafica, Imagen, Nivel, Planta, SubNivel, TablaDetectada, TarjetaTexto};
pub use storage::{FileStorage, MemoryStorage, ReportStorage};
pub use store::{ReportStore, StoreError};
