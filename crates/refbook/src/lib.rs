//! # refbook
//!
//! Resolve cross-sheet and cross-workbook references in spreadsheet master
//! data, then export the resolved sheets or generate model code from them.
//!
//! A workbook declares its references in a `_references` sheet. Each
//! definition maps a column of a data sheet to a key/value pair of columns in
//! another sheet, possibly in another workbook next to it. Resolving a sheet
//! replaces every key in such a column by the value it maps to, and gives the
//! column the value column's type.
//!
//! ## Features
//!
//! - Typed sheets from the type / name / description header convention
//! - Direct and polymorphic (per-row) references across workbooks
//! - CSV, JSON and YAML export of resolved sheets
//! - Go and C# model generation
//! - Write-back of reference data, defined names and list validations
//!
//! ## Example
//!
//! ```rust,no_run
//! use refbook::prelude::*;
//!
//! let mut book = open("master/items.xlsx")?;
//!
//! let exporter = build_exporter(ExportFormat::Json, ExportOptions::new("out"));
//! book.export(exporter.as_ref())?;
//!
//! let generator = build_generator(Language::Go, GenerateOptions::new("model"));
//! let mut book = open("master/items.xlsx")?;
//! book.generate(generator.as_ref())?;
//! # Ok::<(), refbook::Error>(())
//! ```

pub mod error;
pub mod prelude;

use std::path::{Path, PathBuf};

pub use error::{Error, Result};

// Re-export core types
pub use refbook_core::{
    is_exportable_sheet, parse_value, CellAddress, CellRange, Column, ColumnType, ReferenceDefinition,
    ReferenceResolver, Row, Sheet, Value, Workbook, WorkbookUpdate, REFERENCES_SHEET,
    REFERENCE_DATA_SHEET, TYPES_SHEET,
};

// Re-export I/O, export and generator types
pub use refbook_codegen::{build_generator, GenerateError, GenerateOptions, Generator, Language};
pub use refbook_export::{
    build_exporter, CsvExportOptions, ExportError, ExportFormat, ExportOptions, Exporter,
    MetadataExporter,
};
pub use refbook_xlsx::{XlsxError, XlsxOpener, XlsxWorkbook};

/// A workbook backed by an `.xlsx` package
pub type XlsxBook = Workbook<XlsxWorkbook>;

/// Open an `.xlsx` workbook.
///
/// Reference files named by its definitions are opened from the same
/// directory when first needed.
pub fn open<P: AsRef<Path>>(path: P) -> Result<XlsxBook> {
    let path = path.as_ref();
    let storage = XlsxWorkbook::open(path)?;
    tracing::debug!(path = %path.display(), "opened workbook");
    Ok(Workbook::with_opener(path, storage, XlsxOpener))
}

/// Extension trait for Workbook to add the file-level operations
pub trait WorkbookExt {
    /// Resolve every data sheet once and export it, in workbook order
    fn export(&mut self, exporter: &dyn Exporter) -> Result<Vec<PathBuf>>;

    /// Resolve every data sheet once and generate its model, in workbook order
    fn generate(&mut self, generator: &dyn Generator) -> Result<Vec<PathBuf>>;

    /// Write the references document and per-sheet schemas into `out_dir`
    fn export_metadata<P: AsRef<Path>>(&mut self, out_dir: P) -> Result<Vec<PathBuf>>;

    /// Rewrite reference data, defined names and validations in place
    fn update_references(&mut self) -> Result<WorkbookUpdate>;
}

fn data_sheet_names(book: &XlsxBook) -> Vec<String> {
    book.sheet_names()
        .into_iter()
        .filter(|name| is_exportable_sheet(name))
        .collect()
}

impl WorkbookExt for XlsxBook {
    fn export(&mut self, exporter: &dyn Exporter) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for name in data_sheet_names(self) {
            let sheet = self.resolve_sheet(&name)?;
            written.push(exporter.export(sheet)?);
        }
        Ok(written)
    }

    fn generate(&mut self, generator: &dyn Generator) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for name in data_sheet_names(self) {
            let sheet = self.resolve_sheet(&name)?;
            written.push(generator.generate(sheet)?);
        }
        Ok(written)
    }

    fn export_metadata<P: AsRef<Path>>(&mut self, out_dir: P) -> Result<Vec<PathBuf>> {
        let definitions = self.resolver()?.definitions().to_vec();
        let book_name = self.name();

        let mut sheets = Vec::new();
        for name in self.sheet_names() {
            if MetadataExporter::schema_name(&book_name, &name).is_some() {
                sheets.push(self.data_sheet(&name)?.clone());
            }
        }

        let written = MetadataExporter::new(out_dir.as_ref()).export(&book_name, &definitions, &sheets)?;
        Ok(written)
    }

    fn update_references(&mut self) -> Result<WorkbookUpdate> {
        let update = self.plan_update()?;
        let path = self.path().to_path_buf();
        self.storage_mut().save_update(&update, &path)?;
        tracing::info!(
            path = %path.display(),
            names = update.defined_names.len(),
            sheets = update.validations.len(),
            "updated references"
        );
        Ok(update)
    }
}
