//! Facade error type

use thiserror::Error;

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of the refbook operations
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] refbook_core::Error),

    #[error(transparent)]
    Xlsx(#[from] refbook_xlsx::XlsxError),

    #[error(transparent)]
    Export(#[from] refbook_export::ExportError),

    #[error(transparent)]
    Generate(#[from] refbook_codegen::GenerateError),
}
