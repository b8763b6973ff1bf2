//! Attaching spreadsheets, images, text cards and collages to a sub-level.
use crate::detection::detect_tables;
use crate::error::{InformeError, ResultMessage};
use crate::grid::Grid;
use crate::report::model::{ArchivoExcel, Collage, Imagen, SubNivel, TarjetaTexto};
use crate::spreadsheet;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum AttachError {
    #[error("No se encontraron datos válidos en '{0}'")]
    NoValidData(String),

    #[error("'{0}' no es una imagen compatible")]
    UnsupportedImage(String),

    #[error("Collage inválido: {0}")]
    InvalidCollage(String),

    #[error("La tarjeta de texto necesita un título")]
    MissingTitle,
}

/// Image signatures and the MIME type they imply.
const IMAGE_SIGNATURES: [(&[u8], &str); 6] = [
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"BM", "image/bmp"),
    (b"RIFF", "image/webp"),
];

const MIN_COLLAGE_IMAGES: usize = 2;

/// Reads the first sheet of the spreadsheet at `path`.
pub fn read_spreadsheet_file(path: &Path) -> Result<Grid, InformeError> {
    spreadsheet::read_first_grid(path).with_prefix(&format!("Error al leer '{}'", path.display()))
}

/// Detects the tables of `grid` and attaches them as one spreadsheet record.
///
/// Returns the index of the new record in `archivos_excel`.
pub fn attach_spreadsheet(subnivel: &mut SubNivel, name: &str, grid: &Grid) -> Result<usize, InformeError> {
    let tables = detect_tables(grid);
    let Some(record) = ArchivoExcel::from_tables(name, tables) else {
        warn!(name, "No tables detected");
        return Err(AttachError::NoValidData(name.to_owned()).into());
    };
    debug!(name, tables = record.table_count(), subnivel = %subnivel.id, "Spreadsheet attached");
    subnivel.archivos_excel.push(record);
    Ok(subnivel.archivos_excel.len() - 1)
}

fn image_mime_type(bytes: &[u8]) -> Option<&'static str> {
    IMAGE_SIGNATURES
        .iter()
        .find(|(signature, mime)| {
            bytes.starts_with(signature) && (*mime != "image/webp" || bytes.get(8..12) == Some(b"WEBP".as_slice()))
        })
        .map(|(_, mime)| *mime)
}

impl Imagen {
    /// Wraps raw image bytes into a `data:` URL after checking the file signature.
    pub fn from_bytes(nombre: &str, bytes: &[u8]) -> Result<Imagen, InformeError> {
        let mime = image_mime_type(bytes).ok_or_else(|| AttachError::UnsupportedImage(nombre.to_owned()))?;
        Ok(Imagen {
            nombre: nombre.to_owned(),
            datos: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        })
    }

    /// MIME type declared by the `data:` URL, if any.
    pub fn mime_type(&self) -> Option<&str> {
        let header = self.datos.strip_prefix("data:")?.split_once(',')?.0;
        header.split(';').next().filter(|mime| !mime.is_empty())
    }

    /// Decodes the image back to bytes; plain base64 without a `data:` header is accepted.
    pub fn decode(&self) -> Result<Vec<u8>, InformeError> {
        let payload = match self.datos.split_once(',') {
            Some((header, payload)) if header.starts_with("data:") => payload,
            _ => self.datos.as_str(),
        };
        Ok(STANDARD.decode(payload.trim())?)
    }
}

/// Adds a text card; the title is required, both fields are trimmed.
pub fn add_text_card(subnivel: &mut SubNivel, titulo: &str, contenido: &str) -> Result<(), InformeError> {
    let titulo = titulo.trim();
    if titulo.is_empty() {
        Err(AttachError::MissingTitle)?
    }
    subnivel.tarjetas_texto.push(TarjetaTexto {
        titulo: titulo.to_owned(),
        contenido: contenido.trim().to_owned(),
    });
    Ok(())
}

/// Groups existing images of the sub-level into a named collage.
///
/// Needs a non-blank name and at least two distinct image indices; images
/// keep the sub-level order regardless of the selection order.
pub fn add_collage(subnivel: &mut SubNivel, nombre: &str, indices: &[usize]) -> Result<(), InformeError> {
    let nombre = nombre.trim();
    if nombre.is_empty() {
        Err(AttachError::InvalidCollage("el nombre está vacío".to_owned()))?
    }
    let mut selected = indices.to_vec();
    selected.sort_unstable();
    selected.dedup();
    if selected.len() < MIN_COLLAGE_IMAGES {
        Err(AttachError::InvalidCollage(format!("se necesitan al menos {MIN_COLLAGE_IMAGES} imágenes")))?
    }
    let imagenes = selected
        .iter()
        .map(|&index| {
            subnivel
                .imagenes
                .get(index)
                .cloned()
                .ok_or_else(|| AttachError::InvalidCollage(format!("la imagen {index} no existe")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    subnivel.collages.push(Collage {
        nombre: nombre.to_owned(),
        imagenes,
    });
    Ok(())
}
