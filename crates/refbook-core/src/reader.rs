//! Sheet readers
//!
//! The resolver opens reference sheets through a [`SheetReader`]. The
//! file-backed [`FileSheetReader`] opens each workbook once and reuses its
//! sheet cache; [`MemoryReader`] serves sheets from a map and is meant for
//! tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::sheet::Sheet;
use crate::workbook::Workbook;

/// Opens a parsed data sheet from a workbook path
pub trait SheetReader {
    /// Open `sheet` from the workbook at `path`
    fn open(&mut self, path: &Path, sheet: &str) -> Result<&Sheet>;
}

/// Cell-level access to an opened workbook container
pub trait WorkbookStorage {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// All rows of a sheet as strings, trailing empty cells trimmed
    fn sheet_rows(&mut self, name: &str) -> Result<Vec<Vec<String>>>;
}

/// Opens workbook storage from a path
pub trait StorageOpener {
    type Storage: WorkbookStorage;

    fn open(&self, path: &Path) -> Result<Self::Storage>;
}

/// File-backed reader that keeps every workbook it opens
pub struct FileSheetReader<O: StorageOpener> {
    opener: O,
    workbooks: HashMap<PathBuf, Workbook<O::Storage>>,
}

impl<O: StorageOpener> FileSheetReader<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            workbooks: HashMap::new(),
        }
    }

    /// Number of workbooks opened so far
    pub fn open_count(&self) -> usize {
        self.workbooks.len()
    }
}

impl<O> SheetReader for FileSheetReader<O>
where
    O: StorageOpener + Clone + 'static,
    O::Storage: 'static,
{
    fn open(&mut self, path: &Path, sheet: &str) -> Result<&Sheet> {
        let workbook = match self.workbooks.entry(path.to_path_buf()) {
            std::collections::hash_map::Entry::Occupied(entry) => {
                tracing::debug!(path = %path.display(), sheet, "reference workbook cache hit");
                entry.into_mut()
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                tracing::debug!(path = %path.display(), sheet, "opening reference workbook");
                let storage = self.opener.open(path)?;
                entry.insert(Workbook::with_opener(path, storage, self.opener.clone()))
            }
        };
        workbook.data_sheet(sheet)
    }
}

/// In-memory reader keyed by sheet name; the path is ignored
#[derive(Debug, Default)]
pub struct MemoryReader {
    sheets: HashMap<String, Sheet>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sheet under its own name
    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.insert(sheet);
        self
    }

    pub fn insert(&mut self, sheet: Sheet) {
        self.sheets.insert(sheet.name.clone(), sheet);
    }
}

impl SheetReader for MemoryReader {
    /// A missing sheet yields an empty sheet with no columns
    fn open(&mut self, _path: &Path, sheet: &str) -> Result<&Sheet> {
        Ok(self
            .sheets
            .entry(sheet.to_string())
            .or_insert_with(|| Sheet::empty(sheet)))
    }
}
