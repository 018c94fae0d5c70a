//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur during XLSX reading/writing
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Sheet name not present in the workbook
    #[error("sheet {0} does not exist")]
    SheetNotFound(String),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] refbook_core::Error),
}

impl From<XlsxError> for refbook_core::Error {
    fn from(e: XlsxError) -> Self {
        let source_name = match &e {
            XlsxError::SheetNotFound(name) | XlsxError::MissingPart(name) => name.clone(),
            _ => "xlsx package".to_string(),
        };
        refbook_core::Error::source_open(source_name, e)
    }
}
