//! Write-back plan for a workbook
//!
//! [`WorkbookUpdate`] describes what the storage layer must write so that the
//! workbook offers drop-down lists for its reference columns: the key columns
//! in the `_reference_data` sheet, a defined name per named reference, and a
//! list validation per consuming column.

use std::collections::BTreeMap;

use crate::address::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::reference::Reference;
use crate::sheet::BODY_ROW;
use crate::workbook::SheetCache;
use crate::REFERENCE_DATA_SHEET;

/// Keys of one direct reference, written down one column of `_reference_data`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDataColumn {
    /// Column index (0-based), the definition's ordinal
    pub index: usize,
    /// Raw keys, written from row 1
    pub keys: Vec<String>,
}

/// A workbook-scoped defined name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    /// Formula without the leading `=`, e.g. `_reference_data!$A$1:$A$3`
    pub refers_to: String,
}

/// A drop-down list validation over a cell range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListValidation {
    pub sqref: String,
    pub formula: String,
    pub allow_blank: bool,
}

/// Everything `update` writes back into a workbook
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkbookUpdate {
    pub reference_data: Vec<ReferenceDataColumn>,
    pub defined_names: Vec<DefinedName>,
    /// Validations per sheet; existing validations of these sheets are replaced
    pub validations: BTreeMap<String, Vec<ListValidation>>,
}

impl WorkbookUpdate {
    /// Build the plan from built references.
    ///
    /// Every sheet named by a definition must already be in `sheets`.
    pub fn plan(references: &[Reference], sheets: &SheetCache) -> Result<Self> {
        let mut update = Self::default();

        for reference in references {
            let definition = &reference.definition;

            if !definition.is_polymorphic() {
                let keys = reference.raw_keys();
                if !definition.reference_name.is_empty() {
                    let last = keys.len().max(1) - 1;
                    let range = CellRange::column(definition.index, 0, last, true)?;
                    update.defined_names.push(DefinedName {
                        name: definition.reference_name.clone(),
                        refers_to: format!("{}!{}", REFERENCE_DATA_SHEET, range),
                    });
                }
                update.reference_data.push(ReferenceDataColumn {
                    index: definition.index,
                    keys,
                });
            }

            if definition.sheet.is_empty() {
                continue;
            }
            let sheet = sheets
                .get(&definition.sheet)
                .ok_or_else(|| Error::source_open(definition.sheet.as_str(), "sheet not loaded"))?;
            let (target, source) = sheet.validation_ranges(definition)?;
            let formula = if definition.is_polymorphic() {
                let key = CellAddress::from_indices(BODY_ROW, reference.key_column.index, false)?;
                format!(
                    "INDIRECT(${}{})",
                    CellAddress::column_to_letters(key.col),
                    key.row + 1
                )
            } else {
                format!("{}!{}", REFERENCE_DATA_SHEET, source)
            };

            tracing::debug!(sheet = %definition.sheet, sqref = %target, %formula, "planned validation");
            update
                .validations
                .entry(definition.sheet.clone())
                .or_default()
                .push(ListValidation {
                    sqref: target,
                    formula,
                    allow_blank: true,
                });
        }

        Ok(update)
    }

    /// Whether an existing defined name survives the update
    pub fn retains_defined_name(name: &str) -> bool {
        name.starts_with('_')
    }

    /// Number of rows the `_reference_data` sheet needs
    pub fn reference_data_rows(&self) -> usize {
        self.reference_data
            .iter()
            .map(|c| c.keys.len())
            .max()
            .unwrap_or(0)
    }
}
