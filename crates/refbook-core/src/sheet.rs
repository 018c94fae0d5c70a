//! Typed sheet model
//!
//! A data sheet follows a fixed header convention:
//!
//! | physical row | content |
//! |---|---|
//! | 0 | column type tags |
//! | 1 | column names |
//! | 2 | descriptions |
//! | 3.. | data |
//!
//! The reference-definition sheet instead carries one header row of field
//! names followed by data rows, every column implicitly a string.

use std::collections::BTreeMap;

use crate::address::CellRange;
use crate::definition::ReferenceDefinition;
use crate::error::{Error, Result};
use crate::value::{parse_value, ColumnType, Value};

/// Physical row holding the column type tags
pub const TYPE_ROW: usize = 0;
/// Physical row holding the column names
pub const NAME_ROW: usize = 1;
/// Physical row holding the column descriptions
pub const DESCRIPTION_ROW: usize = 2;
/// First physical data row
pub const BODY_ROW: usize = 3;

/// Last physical row (0-based) covered by validation ranges
pub const VALIDATION_LAST_ROW: usize = 9998;

/// A column of a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name from the header row; may be empty
    pub name: String,
    /// Declared type, `None` while unset
    pub ty: Option<ColumnType>,
    /// Position of the column (0-based), equal to the cell index in every row
    pub index: usize,
    /// Free-form description from the third header row
    pub description: String,
}

impl Column {
    /// Create a column with no description
    pub fn new(name: impl Into<String>, ty: Option<ColumnType>, index: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            index,
            description: String::new(),
        }
    }

    /// Exportable columns have both a name and a type
    pub fn is_exportable(&self) -> bool {
        !self.name.is_empty() && self.ty.is_some()
    }
}

/// A single cell: the original string and its typed value
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub raw: String,
    pub value: Value,
}

impl Cell {
    pub fn new(raw: impl Into<String>, value: Value) -> Self {
        Self {
            raw: raw.into(),
            value,
        }
    }

    /// A cell whose value is its raw string
    pub fn text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            value: Value::String(raw.clone()),
            raw,
        }
    }
}

/// A data row. Cell `i` belongs to the sheet column with index `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Get the cell at a column index
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Cells belonging to any of the named columns, in row order
    pub fn cells_named<'a>(&'a self, columns: &[Column], names: &[&str]) -> Vec<&'a Cell> {
        columns
            .iter()
            .filter(|c| names.contains(&c.name.as_str()))
            .filter_map(|c| self.cells.get(c.index))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A typed table parsed from one worksheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl Sheet {
    /// A sheet with no columns and no rows
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a data sheet from its physical rows.
    ///
    /// The first row fixes the column set. Data rows shorter than the column
    /// set read as empty strings for the missing cells.
    pub fn parse_data(name: impl Into<String>, rows: &[Vec<String>]) -> Result<Self> {
        let mut sheet = Sheet::empty(name);

        for (i, physical) in rows.iter().enumerate() {
            match i {
                TYPE_ROW => {
                    for (j, tag) in physical.iter().enumerate() {
                        let ty = ColumnType::parse_tag(tag)?;
                        sheet.columns.push(Column::new("", ty, j));
                    }
                }
                NAME_ROW | DESCRIPTION_ROW => {
                    for (column, text) in sheet.columns.iter_mut().zip(physical) {
                        let text = text.clone();
                        if i == NAME_ROW {
                            column.name = text;
                        } else {
                            column.description = text;
                        }
                    }
                }
                _ => {
                    let cells = sheet
                        .columns
                        .iter()
                        .map(|column| {
                            let raw = physical.get(column.index).map_or("", String::as_str);
                            parse_value(column.ty, raw).map(|value| Cell::new(raw, value))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    sheet.rows.push(Row::new(cells));
                }
            }
        }

        Ok(sheet)
    }

    /// Parse the reference-definition sheet from its physical rows.
    ///
    /// Blank headers produce no column. Never fails.
    pub fn parse_reference_definitions(name: impl Into<String>, rows: &[Vec<String>]) -> Self {
        let mut sheet = Sheet::empty(name);
        let mut rows = rows.iter();

        if let Some(header) = rows.next() {
            sheet.columns = header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(j, name)| Column::new(name.as_str(), Some(ColumnType::String), j))
                .collect();
        }

        for physical in rows {
            let cells = sheet
                .columns
                .iter()
                .map(|column| Cell::text(physical.get(column.index).map_or("", String::as_str)))
                .collect();
            sheet.rows.push(Row::new(cells));
        }

        sheet
    }

    /// Find a column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::ColumnNotFound {
                sheet: self.name.clone(),
                column: name.to_string(),
            })
    }

    pub(crate) fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Exportable columns in sheet order
    pub fn exportable_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_exportable())
    }

    /// One `column name -> value` map per row, exportable columns only
    pub fn records(&self) -> Vec<BTreeMap<&str, &Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.exportable_columns()
                    .filter_map(|c| row.get(c.index).map(|cell| (c.name.as_str(), &cell.value)))
                    .collect()
            })
            .collect()
    }

    /// Validation ranges for a definition targeting this sheet.
    ///
    /// Returns the consuming column's data range (`B4:B9999`) and the
    /// definition's column in the reference-data sheet (`$A$1:$A$9999`).
    pub fn validation_ranges(&self, definition: &ReferenceDefinition) -> Result<(String, String)> {
        let column = self.column(&definition.column)?;
        let target = CellRange::column(column.index, BODY_ROW, VALIDATION_LAST_ROW, false)?;
        let source = CellRange::column(definition.index, 0, VALIDATION_LAST_ROW, true)?;
        Ok((target.to_a1_string(), source.to_a1_string()))
    }
}
