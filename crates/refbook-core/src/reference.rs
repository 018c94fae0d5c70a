//! Reference lookup tables and resolution
//!
//! A [`ReferenceResolver`] owns the definitions of one workbook and the
//! reader used to open their source sheets. Lookup tables are built once, on
//! first use, and then reused for every sheet the resolver is asked to
//! resolve.

use std::collections::HashMap;

use crate::definition::ReferenceDefinition;
use crate::error::{Error, Result};
use crate::reader::SheetReader;
use crate::sheet::{Cell, Column, Sheet};
use crate::value::{type_name, ColumnType};

/// A lookup table built from one definition
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub definition: ReferenceDefinition,
    /// Key column of the source sheet
    pub key_column: Column,
    /// Value column of the source sheet; `None` for polymorphic definitions
    pub value_column: Option<Column>,
    /// Source key cells in row order
    pub keys: Vec<Cell>,
    /// Source value cells, parallel to `keys`
    pub values: Vec<Cell>,
    value_map: HashMap<String, usize>,
}

impl Reference {
    fn build(definition: &ReferenceDefinition, source: &Sheet) -> Result<Self> {
        let key_column = source.column(&definition.reference_key)?.clone();

        if definition.is_polymorphic() {
            return Ok(Self {
                definition: definition.clone(),
                key_column,
                value_column: None,
                keys: Vec::new(),
                values: Vec::new(),
                value_map: HashMap::new(),
            });
        }

        let value_column = source.column(&definition.reference_value)?.clone();
        let mut keys = Vec::with_capacity(source.rows.len());
        let mut values = Vec::with_capacity(source.rows.len());
        let mut value_map = HashMap::with_capacity(source.rows.len());

        for row in &source.rows {
            if let (Some(key), Some(value)) = (row.get(key_column.index), row.get(value_column.index)) {
                // duplicate keys: the last row wins
                value_map.insert(key.raw.clone(), values.len());
                keys.push(key.clone());
                values.push(value.clone());
            }
        }

        Ok(Self {
            definition: definition.clone(),
            key_column,
            value_column: Some(value_column),
            keys,
            values,
            value_map,
        })
    }

    /// Value cell for a raw key
    pub fn lookup(&self, raw: &str) -> Option<&Cell> {
        self.value_map.get(raw).and_then(|&i| self.values.get(i))
    }

    /// Type of the value column, `None` when untyped or polymorphic
    pub fn value_type(&self) -> Option<ColumnType> {
        self.value_column.as_ref().and_then(|c| c.ty)
    }

    /// Raw key strings in source row order
    pub fn raw_keys(&self) -> Vec<String> {
        self.keys.iter().map(|c| c.raw.clone()).collect()
    }

    fn targets(&self, sheet: &Sheet) -> Vec<usize> {
        if self.definition.sheet != sheet.name {
            return Vec::new();
        }
        sheet
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name == self.definition.column)
            .map(|(position, _)| position)
            .collect()
    }
}

/// Resolves reference columns of sheets against lookup tables
pub struct ReferenceResolver {
    definitions: Vec<ReferenceDefinition>,
    reader: Box<dyn SheetReader>,
    references: Option<Vec<Reference>>,
}

impl ReferenceResolver {
    pub fn new(definitions: Vec<ReferenceDefinition>, reader: Box<dyn SheetReader>) -> Self {
        Self {
            definitions,
            reader,
            references: None,
        }
    }

    /// The definitions this resolver was built from
    pub fn definitions(&self) -> &[ReferenceDefinition] {
        &self.definitions
    }

    /// Lookup tables, one per definition, built on first call.
    ///
    /// A failed build is not memoized; the next call retries.
    pub fn references(&mut self) -> Result<&[Reference]> {
        let references = match self.references.take() {
            Some(references) => references,
            None => self.build_references()?,
        };
        Ok(self.references.insert(references))
    }

    fn build_references(&mut self) -> Result<Vec<Reference>> {
        let mut references = Vec::with_capacity(self.definitions.len());
        for definition in &self.definitions {
            let path = definition.reference_file_path();
            let source = self.reader.open(&path, &definition.reference_sheet)?;
            references.push(Reference::build(definition, source)?);
            tracing::debug!(
                path = %path.display(),
                sheet = %definition.reference_sheet,
                key = %definition.reference_key,
                "built reference"
            );
        }
        Ok(references)
    }

    /// Rewrite the reference columns of `sheet` in place.
    ///
    /// Polymorphic columns are resolved before direct ones, since their alias
    /// cells may themselves be direct reference columns. Resolution stops at
    /// the first error and leaves rows rewritten so far as they are. Calling
    /// this twice on the same sheet looks up already resolved values and
    /// normally fails.
    pub fn resolve(&mut self, sheet: &mut Sheet) -> Result<()> {
        let references = self.references()?;

        let aliases: HashMap<&str, &Reference> = references
            .iter()
            .filter(|r| !r.definition.reference_name.is_empty())
            .map(|r| (r.definition.reference_name.as_str(), r))
            .collect();

        for reference in references.iter().filter(|r| r.definition.is_polymorphic()) {
            for position in reference.targets(sheet) {
                resolve_polymorphic(sheet, position, reference, &aliases)?;
            }
        }

        for reference in references.iter().filter(|r| !r.definition.is_polymorphic()) {
            for position in reference.targets(sheet) {
                resolve_direct(sheet, position, reference)?;
            }
        }

        tracing::debug!(sheet = %sheet.name, rows = sheet.rows.len(), "resolved references");
        Ok(())
    }
}

fn resolve_polymorphic(
    sheet: &mut Sheet,
    position: usize,
    reference: &Reference,
    aliases: &HashMap<&str, &Reference>,
) -> Result<()> {
    let column = &mut sheet.columns[position];
    let key_index = reference.key_column.index;

    for (i, row) in sheet.rows.iter_mut().enumerate() {
        let alias = row.get(key_index).map_or("", |c| c.raw.as_str());
        let target = aliases.get(alias).ok_or_else(|| Error::AliasNotFound {
            sheet: sheet.name.clone(),
            row: i + 1,
            column: column.name.clone(),
            alias: alias.to_string(),
        })?;

        let Some(cell) = row.cells.get_mut(column.index) else {
            continue;
        };
        let value = target.lookup(&cell.raw).ok_or_else(|| Error::ValueNotFound {
            sheet: sheet.name.clone(),
            row: i + 1,
            column: column.name.clone(),
            raw: cell.raw.clone(),
            reference_sheet: target.definition.reference_sheet.clone(),
            reference_key: target.definition.reference_key.clone(),
        })?;
        *cell = value.clone();

        let resolved = target.value_type();
        match column.ty {
            None | Some(ColumnType::Ref) => column.ty = resolved,
            declared if declared != resolved => {
                return Err(Error::TypeMismatch {
                    sheet: sheet.name.clone(),
                    row: i + 1,
                    column: column.name.clone(),
                    declared: type_name(declared).to_string(),
                    resolved: type_name(resolved).to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

fn resolve_direct(sheet: &mut Sheet, position: usize, reference: &Reference) -> Result<()> {
    let column = &mut sheet.columns[position];

    for (i, row) in sheet.rows.iter_mut().enumerate() {
        let Some(cell) = row.cells.get_mut(column.index) else {
            continue;
        };
        if cell.raw.is_empty() {
            continue;
        }
        let value = reference.lookup(&cell.raw).ok_or_else(|| Error::ValueNotFound {
            sheet: sheet.name.clone(),
            row: i + 1,
            column: column.name.clone(),
            raw: cell.raw.clone(),
            reference_sheet: reference.definition.reference_sheet.clone(),
            reference_key: reference.definition.reference_key.clone(),
        })?;
        *cell = value.clone();
    }

    // no per-row check here, the value column decides
    column.ty = reference.value_type();
    Ok(())
}
