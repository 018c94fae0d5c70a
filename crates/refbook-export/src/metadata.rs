//! Schema and reference-definition metadata
//!
//! The metadata exporter describes a workbook without resolving it: one
//! `<book>_references.yaml` listing every definition, and one
//! `<sheet>.yaml` per data sheet with the declared column types. A column
//! declared `ref` that a definition targets carries the definition's
//! source as `ref`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use refbook_core::value::type_name;
use refbook_core::{ColumnType, ReferenceDefinition, Sheet, REFERENCES_SHEET, TYPES_SHEET};
use serde::{Deserialize, Serialize};

use crate::error::ExportResult;

/// Contents of `<book>_references.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencesDocument {
    pub references: Vec<ReferenceEntry>,
}

/// One definition row, as written in the references document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub sheet: String,
    pub column: String,
    pub reference_file: String,
    pub reference_sheet: String,
    pub reference_key: String,
    pub reference_value: String,
    pub reference_name: String,
}

impl From<&ReferenceDefinition> for ReferenceEntry {
    fn from(d: &ReferenceDefinition) -> Self {
        Self {
            sheet: d.sheet.clone(),
            column: d.column.clone(),
            reference_file: d.reference_file.clone(),
            reference_sheet: d.reference_sheet.clone(),
            reference_key: d.reference_key.clone(),
            reference_value: d.reference_value.clone(),
            reference_name: d.reference_name.clone(),
        }
    }
}

/// Contents of `<sheet>.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSchema {
    pub sheet: String,
    pub schema: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub display_name: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceSpec>,
}

/// Where a `ref` column takes its values from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSpec {
    pub file: String,
    pub sheet: String,
    pub key: String,
    pub value: String,
}

/// Writes workbook metadata as YAML files
pub struct MetadataExporter {
    out_dir: PathBuf,
}

impl MetadataExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Name of the schema document for a sheet, or `None` if the sheet is
    /// not described. The type sheet is renamed after its workbook; other
    /// `_` sheets are skipped.
    pub fn schema_name(book_name: &str, sheet_name: &str) -> Option<String> {
        if sheet_name == TYPES_SHEET {
            Some(format!("{}{}", book_name, TYPES_SHEET))
        } else if sheet_name.starts_with('_') {
            None
        } else {
            Some(sheet_name.to_string())
        }
    }

    /// Build the schema of one data sheet
    pub fn sheet_schema(name: String, sheet: &Sheet, definitions: &[ReferenceDefinition]) -> SheetSchema {
        let schema = sheet
            .columns
            .iter()
            .map(|column| {
                let reference = if column.ty == Some(ColumnType::Ref) {
                    definitions
                        .iter()
                        .rev()
                        .find(|d| d.sheet == sheet.name && d.column == column.name)
                        .map(|d| ReferenceSpec {
                            file: d.reference_file.clone(),
                            sheet: d.reference_sheet.clone(),
                            key: d.reference_key.clone(),
                            value: d.reference_value.clone(),
                        })
                } else {
                    None
                };
                ColumnSchema {
                    name: column.name.clone(),
                    ty: type_name(column.ty).to_string(),
                    display_name: column.description.clone(),
                    reference,
                }
            })
            .collect();
        SheetSchema { sheet: name, schema }
    }

    /// Write the references document and one schema per described sheet.
    ///
    /// `sheets` are unresolved data sheets in workbook order; sheets that
    /// [`schema_name`](Self::schema_name) rejects are ignored. Returns the
    /// written paths.
    pub fn export<'a, I>(
        &self,
        book_name: &str,
        definitions: &[ReferenceDefinition],
        sheets: I,
    ) -> ExportResult<Vec<PathBuf>>
    where
        I: IntoIterator<Item = &'a Sheet>,
    {
        let schemas: Vec<SheetSchema> = sheets
            .into_iter()
            .filter_map(|sheet| {
                Self::schema_name(book_name, &sheet.name)
                    .map(|name| Self::sheet_schema(name, sheet, definitions))
            })
            .collect();

        let document = ReferencesDocument {
            references: definitions.iter().map(ReferenceEntry::from).collect(),
        };

        let mut written = Vec::with_capacity(schemas.len() + 1);
        written.push(self.write(&format!("{}{}", book_name, REFERENCES_SHEET), &document)?);
        for schema in &schemas {
            written.push(self.write(&schema.sheet, schema)?);
        }
        Ok(written)
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> ExportResult<PathBuf> {
        let path = self.out_dir.join(format!("{}.yaml", name));
        write_yaml(&path, value)?;
        tracing::info!(path = %path.display(), "wrote metadata");
        Ok(path)
    }
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> ExportResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet(name: &str, data: &[&[&str]]) -> Sheet {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect();
        Sheet::parse_data(name, &rows).unwrap()
    }

    fn definition(sheet: &str, column: &str, value: &str) -> ReferenceDefinition {
        ReferenceDefinition {
            sheet: sheet.into(),
            column: column.into(),
            reference_file: "master".into(),
            reference_sheet: "Master".into(),
            reference_key: "code".into(),
            reference_value: value.into(),
            ..Default::default()
        }
    }

    #[test]
    fn schema_names() {
        assert_eq!(MetadataExporter::schema_name("game", "Items").as_deref(), Some("Items"));
        assert_eq!(MetadataExporter::schema_name("game", "_types").as_deref(), Some("game_types"));
        assert_eq!(MetadataExporter::schema_name("game", "_references"), None);
        assert_eq!(MetadataExporter::schema_name("game", "_reference_data"), None);
    }

    #[test]
    fn ref_columns_carry_their_definition() {
        let items = sheet(
            "Items",
            &[&["int", "ref", "string"], &["id", "status", "note"], &["ID", "Status", ""]],
        );
        let definitions = vec![
            definition("Items", "status", "label"),
            definition("Items", "note", "label"),
        ];
        let schema = MetadataExporter::sheet_schema("Items".into(), &items, &definitions);

        assert_eq!(
            schema.schema,
            vec![
                ColumnSchema {
                    name: "id".into(),
                    ty: "int".into(),
                    display_name: "ID".into(),
                    reference: None,
                },
                ColumnSchema {
                    name: "status".into(),
                    ty: "ref".into(),
                    display_name: "Status".into(),
                    reference: Some(ReferenceSpec {
                        file: "master".into(),
                        sheet: "Master".into(),
                        key: "code".into(),
                        value: "label".into(),
                    }),
                },
                // not declared ref, so no reference even though a definition targets it
                ColumnSchema {
                    name: "note".into(),
                    ty: "string".into(),
                    display_name: String::new(),
                    reference: None,
                },
            ]
        );
    }

    #[test]
    fn ref_key_is_omitted_when_absent() {
        let items = sheet("Items", &[&["int"], &["id"], &["ID"]]);
        let schema = MetadataExporter::sheet_schema("Items".into(), &items, &[]);
        let yaml = serde_yaml::to_string(&schema).unwrap();
        assert!(!yaml.contains("ref"));
        assert!(yaml.contains("type: int"));
    }
}
