//! # refbook-xlsx
//!
//! XLSX storage for refbook.
//!
//! [`XlsxWorkbook`] reads worksheets into rows of strings for the sheet model
//! and applies a [`refbook_core::WorkbookUpdate`] back into the package,
//! leaving every part it does not touch byte-for-byte as it was.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{XlsxError, XlsxResult};
pub use reader::{XlsxOpener, XlsxWorkbook};
