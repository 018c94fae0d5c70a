//! Reference definitions
//!
//! Each data row of the `_references` sheet declares one reference: a
//! consuming `sheet`/`column` pair and the `reference_file`,
//! `reference_sheet`, `reference_key` and `reference_value` it looks up.
//! An empty `reference_value` marks a polymorphic definition.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sheet::Sheet;

/// Extension appended to a bare `reference_file`
pub const DEFAULT_EXTENSION: &str = "xlsx";

/// Recognized headers of the reference-definition sheet
pub const DEFINITION_HEADERS: [&str; 7] = [
    "sheet",
    "column",
    "reference_file",
    "reference_sheet",
    "reference_key",
    "reference_value",
    "reference_name",
];

/// One row of the reference-definition sheet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceDefinition {
    /// Row ordinal (0-based) in the definition sheet
    pub index: usize,
    /// Directory of the workbook holding the definition
    pub base_dir: PathBuf,
    pub sheet: String,
    pub column: String,
    pub reference_file: String,
    pub reference_sheet: String,
    pub reference_key: String,
    pub reference_value: String,
    pub reference_name: String,
}

impl ReferenceDefinition {
    /// `reference_file` with the default extension when it has none
    pub fn reference_file_name(&self) -> String {
        if self.reference_file.contains('.') {
            self.reference_file.clone()
        } else {
            format!("{}.{}", self.reference_file, DEFAULT_EXTENSION)
        }
    }

    /// Location of the reference workbook relative to `base_dir`
    pub fn reference_file_path(&self) -> PathBuf {
        self.base_dir.join(self.reference_file_name())
    }

    /// A definition without a value column selects its source per row
    pub fn is_polymorphic(&self) -> bool {
        self.reference_value.is_empty()
    }

    fn set(&mut self, header: &str, raw: &str) -> Result<()> {
        let field = match header {
            "sheet" => &mut self.sheet,
            "column" => &mut self.column,
            "reference_file" => &mut self.reference_file,
            "reference_sheet" => &mut self.reference_sheet,
            "reference_key" => &mut self.reference_key,
            "reference_value" => &mut self.reference_value,
            "reference_name" => &mut self.reference_name,
            other => return Err(Error::UnknownDefinitionHeader(other.to_string())),
        };
        *field = raw.to_string();
        Ok(())
    }
}

/// Build definitions from a parsed reference-definition sheet.
///
/// `base_dir` is the directory of the workbook the sheet came from.
pub fn parse_definitions(sheet: &Sheet, base_dir: &Path) -> Result<Vec<ReferenceDefinition>> {
    let mut definitions = Vec::with_capacity(sheet.rows.len());

    for (index, row) in sheet.rows.iter().enumerate() {
        let mut definition = ReferenceDefinition {
            index,
            base_dir: base_dir.to_path_buf(),
            ..Default::default()
        };
        for (column, cell) in sheet.columns.iter().zip(&row.cells) {
            definition.set(&column.name, &cell.raw)?;
        }
        if definition.is_polymorphic() && definition.sheet != definition.reference_sheet {
            return Err(Error::DefinitionInvariantViolation {
                sheet: definition.sheet,
                reference_sheet: definition.reference_sheet,
            });
        }
        definitions.push(definition);
    }

    tracing::debug!(sheet = %sheet.name, count = definitions.len(), "parsed reference definitions");
    Ok(definitions)
}
