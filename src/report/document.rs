//! The exported configuration document.
use crate::error::InformeError;
use crate::report::model::{subniveles, Planta};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

pub const DOCUMENT_VERSION: &str = "1.0";
pub const APPLICATION_NAME: &str = "Radar - Seguridad y Ergonomia";

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("El archivo no tiene el formato correcto de configuración")]
    InvalidFormat,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadatos {
    pub total_tablas: usize,
    pub total_imagenes: usize,
    pub total_graficas: usize,
    pub total_textos: usize,
}

impl Metadatos {
    pub fn count(plantas: &[Planta]) -> Self {
        subniveles(plantas).fold(Self::default(), |mut totals, subnivel| {
            totals.total_tablas += subnivel.archivos_excel.len();
            totals.total_imagenes += subnivel.imagenes.len();
            totals.total_graficas += subnivel.graficas.len();
            totals.total_textos += subnivel.tarjetas_texto.len();
            totals
        })
    }
}

/// A full snapshot of the report tree, as written by export and read by import.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub version: String,
    pub fecha_exportacion: String,
    #[serde(default)]
    pub aplicacion: String,
    #[serde(default)]
    pub total_plantas: usize,
    pub plantas: Vec<Planta>,
    #[serde(default)]
    pub metadatos: Metadatos,
}

impl ReportDocument {
    pub fn new(plantas: Vec<Planta>) -> Self {
        Self::at(plantas, Utc::now())
    }

    pub fn at(plantas: Vec<Planta>, exported_at: DateTime<Utc>) -> Self {
        Self {
            version: DOCUMENT_VERSION.to_owned(),
            fecha_exportacion: exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            aplicacion: APPLICATION_NAME.to_owned(),
            total_plantas: plantas.len(),
            metadatos: Metadatos::count(&plantas),
            plantas,
        }
    }

    pub fn to_json(&self) -> Result<String, InformeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates the document shape before deserializing it.
    ///
    /// `plantas` must be an array and `version` and `fechaExportacion` must be
    /// present and non-empty. A different version is accepted with a warning.
    pub fn parse(text: &str) -> Result<ReportDocument, InformeError> {
        let value: Value = serde_json::from_str(text)?;
        let is_present = |key: &str| match value.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(text)) => !text.is_empty(),
            Some(_) => true,
        };
        let has_plantas = value.get("plantas").map(Value::is_array).unwrap_or(false);
        if !value.is_object() || !has_plantas || !is_present("version") || !is_present("fechaExportacion") {
            Err(DocumentError::InvalidFormat)?
        }

        let document: ReportDocument = serde_json::from_value(value)?;
        if document.version != DOCUMENT_VERSION {
            warn!(version = %document.version, "Configuration version differs from {}", DOCUMENT_VERSION);
        }
        Ok(document)
    }
}

/// `configuracion-radar-YYYY-MM-DD.json`
pub fn suggested_file_name(date: NaiveDate) -> String {
    format!("configuracion-radar-{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::model::{initial_structure, Imagen, TarjetaTexto};
    use chrono::TimeZone;

    #[test]
    fn stamps_and_counts() {
        let mut plantas = initial_structure();
        let subnivel = &mut plantas[1].niveles[2].subniveles[0];
        subnivel.imagenes.push(Imagen::default());
        subnivel.tarjetas_texto.push(TarjetaTexto::default());
        subnivel.tarjetas_texto.push(TarjetaTexto::default());

        let exported_at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        let document = ReportDocument::at(plantas, exported_at);

        assert_eq!(document.version, "1.0");
        assert_eq!(document.fecha_exportacion, "2024-05-17T09:30:00.000Z");
        assert_eq!(document.aplicacion, "Radar - Seguridad y Ergonomia");
        assert_eq!(document.total_plantas, 4);
        assert_eq!(document.metadatos, Metadatos {
            total_tablas: 0,
            total_imagenes: 1,
            total_graficas: 0,
            total_textos: 2,
        });
    }

    #[test]
    fn json_round_trip() -> Result<(), InformeError> {
        let document = ReportDocument::new(initial_structure());
        let json = document.to_json()?;
        assert!(json.contains("\"fechaExportacion\""));
        assert!(json.contains("\"totalTextos\": 0"));
        assert_eq!(ReportDocument::parse(&json)?, document);
        Ok(())
    }

    #[test]
    fn rejects_malformed_documents() {
        for text in [
            r#"{"version": "1.0", "fechaExportacion": "2024-01-01T00:00:00.000Z"}"#,
            r#"{"version": "1.0", "fechaExportacion": "2024-01-01T00:00:00.000Z", "plantas": {}}"#,
            r#"{"fechaExportacion": "2024-01-01T00:00:00.000Z", "plantas": []}"#,
            r#"{"version": "1.0", "fechaExportacion": "", "plantas": []}"#,
            r#"[1, 2, 3]"#,
        ] {
            let error = ReportDocument::parse(text).unwrap_err();
            assert!(matches!(error, InformeError::DocumentError(DocumentError::InvalidFormat)), "{text}");
        }
        assert!(matches!(ReportDocument::parse("{not json"), Err(InformeError::JsonError(_))));
    }

    #[test]
    fn accepts_other_versions() -> Result<(), InformeError> {
        let document = ReportDocument::parse(r#"{"version": "2.0", "fechaExportacion": "x", "plantas": []}"#)?;
        assert_eq!(document.version, "2.0");
        assert!(document.plantas.is_empty());
        Ok(())
    }

    #[test]
    fn file_name_uses_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(suggested_file_name(date), "configuracion-radar-2025-03-09.json");
    }
}
