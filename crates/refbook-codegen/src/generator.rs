//! Go and C# model generators

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use refbook_core::{ColumnType, Sheet};

use crate::error::GenerateResult;
use crate::naming::{go_name, pascal_case, singularize};
use crate::options::{GenerateOptions, Language};

/// Renders and writes the model type of one resolved sheet
pub trait Generator {
    /// Generate code for `sheet`, returning the path of the written file
    fn generate(&self, sheet: &Sheet) -> GenerateResult<PathBuf>;
}

/// Pick the generator for `language`
pub fn build_generator(language: Language, options: GenerateOptions) -> Box<dyn Generator> {
    match language {
        Language::Go => Box::new(GoGenerator::new(options)),
        Language::Csharp => Box::new(CsharpGenerator::new(options)),
    }
}

struct Field {
    name: String,
    ty: &'static str,
    column: String,
}

fn fields(sheet: &Sheet, name: fn(&str) -> String, ty: fn(ColumnType) -> &'static str) -> Vec<Field> {
    sheet
        .exportable_columns()
        .filter_map(|c| {
            c.ty.map(|t| Field {
                name: name(&c.name),
                ty: ty(t),
                column: c.name.clone(),
            })
        })
        .collect()
}

fn write(path: PathBuf, content: String, sheet: &Sheet) -> GenerateResult<PathBuf> {
    fs::write(&path, content)?;
    tracing::info!(sheet = %sheet.name, path = %path.display(), "generated model");
    Ok(path)
}

/// One struct per sheet in `<prefix><sheet>.gen.go`
pub struct GoGenerator {
    options: GenerateOptions,
}

impl GoGenerator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    fn go_type(ty: ColumnType) -> &'static str {
        match ty {
            ColumnType::String => "string",
            ColumnType::Float => "float64",
            ColumnType::Int | ColumnType::Unixtime => "int64",
            ColumnType::Bool => "bool",
            ColumnType::Datetime => "time.Time",
            ColumnType::Date => "civil.Date",
            ColumnType::Ref => "any",
        }
    }

    fn import_for(go_type: &str) -> Option<&'static str> {
        match go_type {
            "time.Time" => Some("time"),
            "civil.Date" => Some("cloud.google.com/go/civil"),
            _ => None,
        }
    }

    /// Source of the generated file
    pub fn render(&self, sheet: &Sheet) -> String {
        let name = format!("{}{}", self.options.prefix, sheet.name);
        let fields = fields(sheet, go_name, Self::go_type);
        let imports: BTreeSet<&str> = fields.iter().filter_map(|f| Self::import_for(f.ty)).collect();

        let mut content = String::from("// Code generated by refbook. DO NOT EDIT.\n\n");
        content.push_str(&format!("package {}\n", self.options.go_package_name));

        match imports.len() {
            0 => {}
            1 => {
                for path in &imports {
                    content.push_str(&format!("\nimport \"{}\"\n", path));
                }
            }
            _ => {
                content.push_str("\nimport (\n");
                for path in &imports {
                    content.push_str(&format!("\t\"{}\"\n", path));
                }
                content.push_str(")\n");
            }
        }

        content.push_str(&format!("\ntype {} struct {{\n", go_name(&singularize(&name))));

        let name_width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
        let type_width = fields.iter().map(|f| f.ty.len()).max().unwrap_or(0);
        let tag_names: Vec<&str> = self
            .options
            .go_tag_names
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        for field in &fields {
            if tag_names.is_empty() {
                content.push_str(&format!("\t{:<w$} {}\n", field.name, field.ty, w = name_width));
                continue;
            }
            let tags: Vec<String> = tag_names
                .iter()
                .map(|t| format!("{}:\"{}\"", t, field.column))
                .collect();
            content.push_str(&format!(
                "\t{:<nw$} {:<tw$} `{}`\n",
                field.name,
                field.ty,
                tags.join(" "),
                nw = name_width,
                tw = type_width
            ));
        }
        content.push_str("}\n");
        content
    }
}

impl Generator for GoGenerator {
    fn generate(&self, sheet: &Sheet) -> GenerateResult<PathBuf> {
        let path = self
            .options
            .out_dir
            .join(format!("{}{}.gen.go", self.options.prefix, sheet.name));
        write(path, self.render(sheet), sheet)
    }
}

/// One class per sheet in `<SingularPascal>.cs`
pub struct CsharpGenerator {
    options: GenerateOptions,
}

impl CsharpGenerator {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    fn csharp_type(ty: ColumnType) -> &'static str {
        match ty {
            ColumnType::String => "string",
            ColumnType::Float => "double",
            ColumnType::Int | ColumnType::Unixtime => "int",
            ColumnType::Bool => "bool",
            ColumnType::Datetime => "DateTime",
            ColumnType::Date => "DateOnly",
            ColumnType::Ref => "object",
        }
    }

    fn class_name(&self, sheet: &Sheet) -> String {
        pascal_case(&singularize(&format!("{}{}", self.options.prefix, sheet.name)))
    }

    pub fn render(&self, sheet: &Sheet) -> String {
        let fields = fields(sheet, pascal_case, Self::csharp_type);

        let mut content = String::from("// <auto-generated />\n");
        if fields.iter().any(|f| matches!(f.ty, "DateTime" | "DateOnly")) {
            content.push_str("using System;\n");
        }
        content.push_str(&format!("\npublic class {}\n{{\n", self.class_name(sheet)));
        for field in &fields {
            content.push_str(&format!("    public {} {} {{ get; set; }}\n", field.ty, field.name));
        }
        content.push_str("}\n");
        content
    }
}

impl Generator for CsharpGenerator {
    fn generate(&self, sheet: &Sheet) -> GenerateResult<PathBuf> {
        let path = self.options.out_dir.join(format!("{}.cs", self.class_name(sheet)));
        write(path, self.render(sheet), sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sheet() -> Sheet {
        let rows: Vec<Vec<String>> = [
            vec!["int", "string", "", "datetime", "date", "bool"],
            vec!["id", "item_name", "memo", "created_at", "release_date", "is_active"],
            vec!["", "", "", "", "", ""],
        ]
        .iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect();
        Sheet::parse_data("Items", &rows).unwrap()
    }

    #[test]
    fn go_struct() {
        let generator = GoGenerator::new(GenerateOptions::default());
        assert_eq!(
            generator.render(&sheet()),
            concat!(
                "// Code generated by refbook. DO NOT EDIT.\n",
                "\n",
                "package model\n",
                "\n",
                "import (\n",
                "\t\"cloud.google.com/go/civil\"\n",
                "\t\"time\"\n",
                ")\n",
                "\n",
                "type Item struct {\n",
                "\tID          int64      `json:\"id\"`\n",
                "\tItemName    string     `json:\"item_name\"`\n",
                "\tCreatedAt   time.Time  `json:\"created_at\"`\n",
                "\tReleaseDate civil.Date `json:\"release_date\"`\n",
                "\tIsActive    bool       `json:\"is_active\"`\n",
                "}\n",
            )
        );
    }

    #[test]
    fn go_tags_and_package() {
        let rows: Vec<Vec<String>> = vec![vec!["int".into()], vec!["user_id".into()]];
        let users = Sheet::parse_data("Users", &rows).unwrap();
        let generator = GoGenerator::new(GenerateOptions {
            prefix: "M".into(),
            go_package_name: "master".into(),
            go_tag_names: vec!["json".into(), "yaml".into()],
            ..Default::default()
        });
        assert_eq!(
            generator.render(&users),
            concat!(
                "// Code generated by refbook. DO NOT EDIT.\n",
                "\n",
                "package master\n",
                "\n",
                "type MUser struct {\n",
                "\tUserID int64 `json:\"user_id\" yaml:\"user_id\"`\n",
                "}\n",
            )
        );
    }

    #[test]
    fn go_without_tags() {
        let rows: Vec<Vec<String>> = vec![vec!["datetime".into()], vec!["at".into()]];
        let events = Sheet::parse_data("Events", &rows).unwrap();
        let generator = GoGenerator::new(GenerateOptions {
            go_tag_names: vec![String::new()],
            ..Default::default()
        });
        let out = generator.render(&events);
        assert!(out.contains("\nimport \"time\"\n"));
        assert!(out.contains("type Event struct {\n\tAt time.Time\n}\n"));
    }

    #[test]
    fn csharp_class() {
        let generator = CsharpGenerator::new(GenerateOptions::default());
        assert_eq!(
            generator.render(&sheet()),
            concat!(
                "// <auto-generated />\n",
                "using System;\n",
                "\n",
                "public class Item\n",
                "{\n",
                "    public int Id { get; set; }\n",
                "    public string ItemName { get; set; }\n",
                "    public DateTime CreatedAt { get; set; }\n",
                "    public DateOnly ReleaseDate { get; set; }\n",
                "    public bool IsActive { get; set; }\n",
                "}\n",
            )
        );
    }
}
