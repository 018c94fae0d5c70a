//! Prelude module - common imports for refbook users
//!
//! ```rust
//! use refbook::prelude::*;
//! ```

pub use crate::{
    build_exporter,
    build_generator,
    open,
    // Values and sheets
    ColumnType,
    Error,
    ExportFormat,
    ExportOptions,
    Exporter,
    GenerateOptions,
    Generator,
    Language,
    Result,
    Sheet,
    Value,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    XlsxBook,
};
