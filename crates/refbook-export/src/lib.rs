//! # refbook-export
//!
//! Writes resolved sheets out as CSV, JSON or YAML, and describes a
//! workbook's schema and reference definitions as YAML metadata.

mod error;
mod exporter;
mod metadata;
mod options;

pub use error::{ExportError, ExportResult};
pub use exporter::{build_exporter, CsvExporter, Exporter, JsonExporter, YamlExporter};
pub use metadata::{ColumnSchema, MetadataExporter, ReferenceEntry, ReferenceSpec, ReferencesDocument, SheetSchema};
pub use options::{CsvExportOptions, ExportFormat, ExportOptions, LineTerminator};
