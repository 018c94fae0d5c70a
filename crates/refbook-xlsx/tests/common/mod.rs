//! Minimal XLSX packages for tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (col % 26) as u8);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// Build a package with one worksheet per `(name, rows)` pair.
///
/// Every non-empty cell is stored in the shared strings table.
/// `defined_names` are `(name, refers_to)` pairs.
pub fn build_xlsx(sheets: &[(&str, Vec<Vec<&str>>)], defined_names: &[(&str, &str)]) -> Vec<u8> {
    let mut shared: Vec<String> = Vec::new();
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();

        let mut content_types = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for (i, (name, rows)) in sheets.iter().enumerate() {
            let n = i + 1;
            content_types.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{n}" r:id="rId{n}"/>"#,
                escape(name)
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));

            let mut sheet = String::from(
                r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
            );
            for (r, row) in rows.iter().enumerate() {
                sheet.push_str(&format!(r#"<row r="{}">"#, r + 1));
                for (c, value) in row.iter().enumerate() {
                    if value.is_empty() {
                        continue;
                    }
                    let idx = match shared.iter().position(|s| s == value) {
                        Some(idx) => idx,
                        None => {
                            shared.push(value.to_string());
                            shared.len() - 1
                        }
                    };
                    sheet.push_str(&format!(
                        r#"<c r="{}{}" t="s"><v>{}</v></c>"#,
                        column_letters(c),
                        r + 1,
                        idx
                    ));
                }
                sheet.push_str("</row>");
            }
            sheet.push_str(r#"</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#);

            zip.start_file(format!("xl/worksheets/sheet{n}.xml"), options).unwrap();
            zip.write_all(sheet.as_bytes()).unwrap();
        }

        workbook.push_str("</sheets>");
        if !defined_names.is_empty() {
            workbook.push_str("<definedNames>");
            for (name, refers_to) in defined_names {
                workbook.push_str(&format!(
                    r#"<definedName name="{}">{}</definedName>"#,
                    escape(name),
                    escape(refers_to)
                ));
            }
            workbook.push_str("</definedNames>");
        }
        workbook.push_str(r#"<calcPr calcId="191029"/></workbook>"#);

        let n = sheets.len() + 1;
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#
        ));
        content_types.push_str("</Types>");

        let mut sst = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
            shared.len()
        );
        for s in &shared {
            sst.push_str(&format!("<si><t>{}</t></si>", escape(s)));
        }
        sst.push_str("</sst>");

        for (name, content) in [
            ("[Content_Types].xml", content_types),
            ("_rels/.rels", r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string()),
            ("xl/workbook.xml", workbook),
            ("xl/_rels/workbook.xml.rels", rels),
            ("xl/sharedStrings.xml", sst),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }

        zip.finish().unwrap();
    }
    buf
}

/// Write a package built by [`build_xlsx`] to `dir/file_name`
pub fn write_xlsx(
    dir: &Path,
    file_name: &str,
    sheets: &[(&str, Vec<Vec<&str>>)],
    defined_names: &[(&str, &str)],
) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, build_xlsx(sheets, defined_names)).unwrap();
    path
}

/// Read one part of a package as text
pub fn read_part(bytes: &[u8], name: &str) -> String {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}
