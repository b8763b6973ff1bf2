use thiserror::Error;

/// Main error type for the report library.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum InformeError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    Base64Error(#[from] base64::DecodeError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),

    // Report module errors
    #[error("{0}")]
    DocumentError(#[from] crate::report::document::DocumentError),

    #[error("{0}")]
    AttachError(#[from] crate::report::attach::AttachError),

    #[error("{0}")]
    StoreError(#[from] crate::report::store::StoreError),

    // Chart module errors
    #[error("{0}")]
    ChartError(#[from] crate::chart::ChartError),
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, InformeError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| InformeError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<(), InformeError> = Err(std::io::Error::other("disk full").into());
        let error = result.with_prefix("Save failed").unwrap_err();
        assert_eq!(error.to_string(), "Save failed: disk full");
    }

    #[test]
    fn ok_none_else_only_replaces_none() {
        let first: Result<Option<u8>, InformeError> = Ok(None);
        assert_eq!(first.ok_none_else(|| Ok(Some(2))).unwrap(), Some(2));

        let second: Result<Option<u8>, InformeError> = Ok(Some(1));
        assert_eq!(second.ok_none_else(|| Ok(Some(2))).unwrap(), Some(1));
    }
}
