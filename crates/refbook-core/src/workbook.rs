//! Workbook entity
//!
//! A [`Workbook`] pairs an opened storage handle with the per-workbook
//! [`SheetCache`] and the memoized [`ReferenceResolver`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::definition::{parse_definitions, ReferenceDefinition};
use crate::error::Result;
use crate::reader::{FileSheetReader, MemoryReader, SheetReader, StorageOpener, WorkbookStorage};
use crate::reference::ReferenceResolver;
use crate::sheet::Sheet;
use crate::update::WorkbookUpdate;
use crate::REFERENCES_SHEET;

/// Parsed data sheets of one workbook, keyed by sheet name
#[derive(Debug, Default)]
pub struct SheetCache {
    sheets: HashMap<String, Sheet>,
}

impl SheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached sheet or parse it with `load` and cache the result.
    ///
    /// A failed load caches nothing.
    pub fn get_or_parse<F>(&mut self, name: &str, load: F) -> Result<&mut Sheet>
    where
        F: FnOnce() -> Result<Sheet>,
    {
        match self.sheets.entry(name.to_string()) {
            std::collections::hash_map::Entry::Occupied(entry) => Ok(entry.into_mut()),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let sheet = load()?;
                tracing::debug!(sheet = name, rows = sheet.rows.len(), "parsed data sheet");
                Ok(entry.insert(sheet))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Sheet> {
        self.sheets.get(name)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// An opened workbook
pub struct Workbook<S: WorkbookStorage> {
    path: PathBuf,
    storage: S,
    sheets: SheetCache,
    reader: Option<Box<dyn SheetReader>>,
    resolver: Option<ReferenceResolver>,
}

impl<S: WorkbookStorage> Workbook<S> {
    /// Create a workbook whose reference sheets are opened with `reader`
    pub fn with_reader(path: impl Into<PathBuf>, storage: S, reader: Box<dyn SheetReader>) -> Self {
        Self {
            path: path.into(),
            storage,
            sheets: SheetCache::new(),
            reader: Some(reader),
            resolver: None,
        }
    }

    /// Create a workbook whose reference workbooks are opened from disk with `opener`
    pub fn with_opener<O>(path: impl Into<PathBuf>, storage: S, opener: O) -> Self
    where
        O: StorageOpener + Clone + 'static,
        O::Storage: 'static,
    {
        Self::with_reader(path, storage, Box::new(FileSheetReader::new(opener)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File stem of the workbook path
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory the workbook lives in; reference files resolve against it
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.storage.sheet_names()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Parsed data sheet, cached for the life of the workbook
    pub fn data_sheet(&mut self, name: &str) -> Result<&Sheet> {
        let Self { storage, sheets, .. } = self;
        sheets
            .get_or_parse(name, || load_data_sheet(storage, name))
            .map(|sheet| &*sheet)
    }

    /// Reference definitions from the `_references` sheet.
    ///
    /// A workbook without that sheet has no definitions.
    pub fn reference_definitions(&mut self) -> Result<Vec<ReferenceDefinition>> {
        if !self.storage.sheet_names().iter().any(|n| n == REFERENCES_SHEET) {
            tracing::debug!(path = %self.path.display(), "no reference definition sheet");
            return Ok(Vec::new());
        }
        let rows = self.storage.sheet_rows(REFERENCES_SHEET)?;
        let sheet = Sheet::parse_reference_definitions(REFERENCES_SHEET, &rows);
        parse_definitions(&sheet, self.base_dir())
    }

    /// The workbook's resolver, built on first call
    pub fn resolver(&mut self) -> Result<&mut ReferenceResolver> {
        let resolver = match self.resolver.take() {
            Some(resolver) => resolver,
            None => {
                let definitions = self.reference_definitions()?;
                let reader = self
                    .reader
                    .take()
                    .unwrap_or_else(|| Box::new(MemoryReader::new()));
                ReferenceResolver::new(definitions, reader)
            }
        };
        Ok(self.resolver.insert(resolver))
    }

    /// Resolve the references of a data sheet in place and return it.
    ///
    /// The cached sheet is mutated; resolving the same sheet twice fails on
    /// the already substituted values.
    pub fn resolve_sheet(&mut self, name: &str) -> Result<&Sheet> {
        self.resolver()?;
        let Self {
            storage,
            sheets,
            resolver,
            ..
        } = self;
        let sheet = sheets.get_or_parse(name, || load_data_sheet(storage, name))?;
        if let Some(resolver) = resolver {
            resolver.resolve(sheet)?;
        }
        Ok(&*sheet)
    }

    /// Compute the reference data, defined names and validations to write back
    pub fn plan_update(&mut self) -> Result<WorkbookUpdate> {
        self.resolver()?;
        let Self {
            storage,
            sheets,
            resolver,
            ..
        } = self;
        let Some(resolver) = resolver else {
            return Ok(WorkbookUpdate::default());
        };
        let references = resolver.references()?;
        for reference in references {
            let name = reference.definition.sheet.as_str();
            if !name.is_empty() {
                sheets.get_or_parse(name, || load_data_sheet(storage, name))?;
            }
        }
        WorkbookUpdate::plan(references, sheets)
    }
}

fn load_data_sheet<S: WorkbookStorage>(storage: &mut S, name: &str) -> Result<Sheet> {
    let rows = storage.sheet_rows(name)?;
    Sheet::parse_data(name, &rows)
}
