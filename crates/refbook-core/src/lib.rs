//! # refbook-core
//!
//! Typed sheet model and reference resolution for refbook.
//!
//! This crate provides:
//! - [`Value`] and [`ColumnType`] - typed cell values and the column type taxonomy
//! - [`Sheet`], [`Column`], [`Row`], [`Cell`] - sheets parsed from the header-row convention
//! - [`ReferenceDefinition`] - rows of the `_references` sheet
//! - [`ReferenceResolver`] - lookup tables and in-place resolution of reference columns
//! - [`Workbook`] - an opened workbook with its sheet cache and memoized resolver
//! - [`WorkbookUpdate`] - reference data, defined names and validations to write back
//!
//! ## Example
//!
//! ```rust
//! use refbook_core::{MemoryReader, ReferenceDefinition, ReferenceResolver, Sheet, Value};
//!
//! fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
//!     data.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect()
//! }
//!
//! let master = Sheet::parse_data(
//!     "Master",
//!     &rows(&[&["string", "string"], &["code", "label"], &[], &["A", "Active"]]),
//! )
//! .unwrap();
//! let mut items = Sheet::parse_data(
//!     "Items",
//!     &rows(&[&["string", "ref"], &["id", "status"], &[], &["1", "A"]]),
//! )
//! .unwrap();
//!
//! let definition = ReferenceDefinition {
//!     sheet: "Items".into(),
//!     column: "status".into(),
//!     reference_sheet: "Master".into(),
//!     reference_key: "code".into(),
//!     reference_value: "label".into(),
//!     ..Default::default()
//! };
//! let reader = MemoryReader::new().with_sheet(master);
//! let mut resolver = ReferenceResolver::new(vec![definition], Box::new(reader));
//!
//! resolver.resolve(&mut items).unwrap();
//! assert_eq!(items.rows[0].cells[1].value, Value::string("Active"));
//! ```

pub mod address;
pub mod definition;
pub mod error;
pub mod reader;
pub mod reference;
pub mod sheet;
pub mod update;
pub mod value;
pub mod workbook;

// Re-exports for convenience
pub use address::{CellAddress, CellRange};
pub use definition::{parse_definitions, ReferenceDefinition};
pub use error::{BoxError, Error, Result};
pub use reader::{FileSheetReader, MemoryReader, SheetReader, StorageOpener, WorkbookStorage};
pub use reference::{Reference, ReferenceResolver};
pub use sheet::{Cell, Column, Row, Sheet};
pub use update::{DefinedName, ListValidation, ReferenceDataColumn, WorkbookUpdate};
pub use value::{parse_value, ColumnType, Value};
pub use workbook::{SheetCache, Workbook};

/// Name of the reference-definition sheet
pub const REFERENCES_SHEET: &str = "_references";

/// Name of the sheet holding reference keys for drop-down lists
pub const REFERENCE_DATA_SHEET: &str = "_reference_data";

/// Name of the type-definition sheet included in metadata exports
pub const TYPES_SHEET: &str = "_types";

/// Sheets whose name starts with `_` hold workbook metadata, not data
pub fn is_exportable_sheet(name: &str) -> bool {
    !name.starts_with('_')
}
