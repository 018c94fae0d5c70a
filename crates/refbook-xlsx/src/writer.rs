//! Applies a [`WorkbookUpdate`] to an XLSX package
//!
//! Only `workbook.xml`, the worksheets receiving validations and the
//! `_reference_data` worksheet are regenerated. A new `_reference_data`
//! sheet also touches the workbook relationships and content types. Every
//! other entry is copied without recompression.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use crate::error::{XlsxError, XlsxResult};
use crate::reader::{
    attr_value, read_part, SheetEntry, XlsxWorkbook, CONTENT_TYPES_PART, WORKBOOK_PART,
    WORKBOOK_RELS_PART,
};
use refbook_core::{CellAddress, ListValidation, WorkbookUpdate, REFERENCE_DATA_SHEET};

const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const WORKSHEET_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// `workbook.xml` children that follow `definedNames`
const AFTER_DEFINED_NAMES: [&[u8]; 10] = [
    b"calcPr",
    b"oleSize",
    b"customWorkbookViews",
    b"pivotCaches",
    b"smartTagPr",
    b"smartTagTypes",
    b"webPublishing",
    b"fileRecoveryPr",
    b"webPublishObjects",
    b"extLst",
];

/// Worksheet children that follow `dataValidations`
const AFTER_DATA_VALIDATIONS: [&[u8]; 20] = [
    b"hyperlinks",
    b"printOptions",
    b"pageMargins",
    b"pageSetup",
    b"headerFooter",
    b"rowBreaks",
    b"colBreaks",
    b"customProperties",
    b"cellWatches",
    b"ignoredErrors",
    b"smartTags",
    b"drawing",
    b"legacyDrawing",
    b"legacyDrawingHF",
    b"picture",
    b"oleObjects",
    b"controls",
    b"webPublishItems",
    b"tableParts",
    b"extLst",
];

impl XlsxWorkbook {
    /// Write the package with `update` applied to `writer`
    pub fn write_update<W: Write + Seek>(
        &mut self,
        update: &WorkbookUpdate,
        writer: W,
    ) -> XlsxResult<()> {
        let mut parts: BTreeMap<String, Vec<u8>> = BTreeMap::new();

        let existing = self
            .sheets
            .iter()
            .find(|s| s.name == REFERENCE_DATA_SHEET)
            .cloned();
        let new_sheet = match existing {
            Some(_) => None,
            None => Some(self.allocate_sheet(REFERENCE_DATA_SHEET)),
        };
        if let Some(entry) = existing.as_ref().or(new_sheet.as_ref()) {
            parts.insert(entry.part.clone(), reference_data_xml(update)?);
        }

        let workbook_xml = read_part(&mut self.archive, WORKBOOK_PART)?;
        parts.insert(
            WORKBOOK_PART.to_string(),
            rewrite_workbook_xml(&workbook_xml, update, new_sheet.as_ref())?,
        );

        if let Some(entry) = &new_sheet {
            let rels = read_part(&mut self.archive, WORKBOOK_RELS_PART)?;
            let target = entry.part.strip_prefix("xl/").unwrap_or(&entry.part);
            let relationship = format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                entry.rel_id,
                WORKSHEET_REL_TYPE,
                escape_xml(target)
            );
            parts.insert(
                WORKBOOK_RELS_PART.to_string(),
                insert_before_close(&rels, "</Relationships>", &relationship)?,
            );

            let content_types = read_part(&mut self.archive, CONTENT_TYPES_PART)?;
            let content_type = format!(
                r#"<Override PartName="/{}" ContentType="{}"/>"#,
                escape_xml(&entry.part),
                WORKSHEET_CONTENT_TYPE
            );
            parts.insert(
                CONTENT_TYPES_PART.to_string(),
                insert_before_close(&content_types, "</Types>", &content_type)?,
            );
        }

        for (sheet, validations) in &update.validations {
            let part = self
                .sheets
                .iter()
                .find(|s| &s.name == sheet)
                .map(|s| s.part.clone())
                .ok_or_else(|| XlsxError::SheetNotFound(sheet.clone()))?;
            let xml = read_part(&mut self.archive, &part)?;
            parts.insert(part, rewrite_data_validations(&xml, validations)?);
            log::debug!("replaced {} data validations in {}", validations.len(), sheet);
        }

        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            let name = file.name().to_string();
            match parts.remove(&name) {
                Some(content) => {
                    zip.start_file(name, options)?;
                    zip.write_all(&content)?;
                }
                None => zip.raw_copy_file(file)?,
            }
        }
        // parts that did not exist before
        for (name, content) in parts {
            zip.start_file(name, options)?;
            zip.write_all(&content)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Apply `update` and replace the file at `path`
    pub fn save_update<P: AsRef<Path>>(&mut self, update: &WorkbookUpdate, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{}.tmp", file_name));

        let result = File::create(&tmp)
            .map_err(XlsxError::from)
            .and_then(|file| self.write_update(update, file));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, path)?;
        log::debug!("saved {}", path.display());
        Ok(())
    }

    /// Pick a fresh sheet id, relationship id and part path for a new sheet
    fn allocate_sheet(&self, name: &str) -> SheetEntry {
        let sheet_id = self.sheets.iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;
        let rel_id = (1..)
            .map(|n| format!("rId{}", n))
            .find(|id| !self.rel_ids.contains(id))
            .unwrap_or_default();
        let part = (1..)
            .map(|n| format!("xl/worksheets/sheet{}.xml", n))
            .find(|p| !self.archive.file_names().any(|existing| existing == p.as_str()))
            .unwrap_or_default();
        SheetEntry {
            name: name.to_string(),
            sheet_id,
            rel_id,
            part,
        }
    }
}

fn is_one_of(name: &[u8], names: &[&[u8]]) -> bool {
    names.iter().any(|n| *n == name)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn insert_before_close(xml: &[u8], close: &str, fragment: &str) -> XlsxResult<Vec<u8>> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| XlsxError::InvalidFormat(format!("part is not UTF-8: {}", e)))?;
    let at = text
        .rfind(close)
        .ok_or_else(|| XlsxError::InvalidFormat(format!("missing {}", close)))?;
    let mut out = String::with_capacity(text.len() + fragment.len());
    out.push_str(&text[..at]);
    out.push_str(fragment);
    out.push_str(&text[at..]);
    Ok(out.into_bytes())
}

/// Worksheet XML holding the reference keys, one definition per column
fn reference_data_xml(update: &WorkbookUpdate) -> XlsxResult<Vec<u8>> {
    let mut columns: Vec<_> = update.reference_data.iter().collect();
    columns.sort_by_key(|c| c.index);

    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>"#,
    );

    for row in 0..update.reference_data_rows() {
        content.push_str(&format!(r#"<row r="{}">"#, row + 1));
        for column in &columns {
            let Some(key) = column.keys.get(row).filter(|k| !k.is_empty()) else {
                continue;
            };
            let address = CellAddress::from_indices(row, column.index, false)?;
            content.push_str(&format!(
                r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                address,
                escape_xml(key)
            ));
        }
        content.push_str("</row>");
    }

    content.push_str("</sheetData>\n</worksheet>");
    Ok(content.into_bytes())
}

/// Rewrite `workbook.xml`: replace user defined names and add a new sheet entry
fn rewrite_workbook_xml(
    xml: &[u8],
    update: &WorkbookUpdate,
    new_sheet: Option<&SheetEntry>,
) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    let mut retained: Vec<(BytesStart<'static>, String)> = Vec::new();
    let mut current: Option<(BytesStart<'static>, String)> = None;
    let mut in_defined_names = false;
    let mut names_written = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;

        if in_defined_names {
            match event {
                Event::Start(e) if e.local_name().as_ref() == b"definedName" => {
                    current = Some((e.into_owned(), String::new()));
                }
                Event::Empty(e) if e.local_name().as_ref() == b"definedName" => {
                    retain_defined_name(&mut retained, (e.into_owned(), String::new()));
                }
                Event::Text(e) => {
                    if let Some((_, text)) = current.as_mut() {
                        text.push_str(&e.unescape()?);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"definedName" => {
                    if let Some(entry) = current.take() {
                        retain_defined_name(&mut retained, entry);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == b"definedNames" => {
                    in_defined_names = false;
                    write_defined_names(&mut writer, &retained, update)?;
                    names_written = true;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        let mut pass_through = true;
        match &event {
            Event::Start(e) if e.local_name().as_ref() == b"definedNames" => {
                in_defined_names = true;
                pass_through = false;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"definedNames" => {
                pass_through = false;
            }
            Event::Start(e) | Event::Empty(e)
                if !names_written && is_one_of(e.local_name().as_ref(), &AFTER_DEFINED_NAMES) =>
            {
                write_defined_names(&mut writer, &retained, update)?;
                names_written = true;
            }
            Event::End(e) if e.local_name().as_ref() == b"sheets" => {
                if let Some(entry) = new_sheet {
                    let sheet_id = entry.sheet_id.to_string();
                    writer
                        .create_element("sheet")
                        .with_attributes([
                            ("name", entry.name.as_str()),
                            ("sheetId", sheet_id.as_str()),
                            ("r:id", entry.rel_id.as_str()),
                        ])
                        .write_empty()?;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"workbook" && !names_written => {
                write_defined_names(&mut writer, &retained, update)?;
                names_written = true;
            }
            Event::Eof => break,
            _ => {}
        }
        if pass_through {
            writer.write_event(event)?;
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn retain_defined_name(retained: &mut Vec<(BytesStart<'static>, String)>, entry: (BytesStart<'static>, String)) {
    let name = attr_value(&entry.0, b"name").unwrap_or_default();
    if WorkbookUpdate::retains_defined_name(&name) {
        retained.push(entry);
    } else {
        log::debug!("removing defined name {}", name);
    }
}

fn write_defined_names(
    writer: &mut Writer<Vec<u8>>,
    retained: &[(BytesStart<'static>, String)],
    update: &WorkbookUpdate,
) -> XlsxResult<()> {
    if retained.is_empty() && update.defined_names.is_empty() {
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new("definedNames")))?;
    for (start, text) in retained {
        writer.write_event(Event::Start(start.borrow()))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(start.to_end()))?;
    }
    for name in &update.defined_names {
        writer
            .create_element("definedName")
            .with_attribute(("name", name.name.as_str()))
            .write_text_content(BytesText::new(&name.refers_to))?;
    }
    writer.write_event(Event::End(BytesEnd::new("definedNames")))?;
    Ok(())
}

/// Replace the `dataValidations` block of a worksheet
fn rewrite_data_validations(xml: &[u8], validations: &[ListValidation]) -> XlsxResult<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::new());
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut skip_until: Option<usize> = None;
    let mut written = false;

    loop {
        let event = reader.read_event_into(&mut buf)?;

        if let Some(target) = skip_until {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    depth -= 1;
                    if depth == target {
                        skip_until = None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        let mut pass_through = true;
        match &event {
            Event::Start(e) | Event::Empty(e)
                if depth == 1 && e.local_name().as_ref() == b"dataValidations" =>
            {
                if !written {
                    write_data_validations(&mut writer, validations)?;
                    written = true;
                }
                pass_through = false;
                if matches!(event, Event::Start(_)) {
                    skip_until = Some(depth);
                    depth += 1;
                }
            }
            Event::Start(e) | Event::Empty(e)
                if depth == 1
                    && !written
                    && is_one_of(e.local_name().as_ref(), &AFTER_DATA_VALIDATIONS) =>
            {
                write_data_validations(&mut writer, validations)?;
                written = true;
            }
            Event::End(e) if depth == 1 && !written && e.local_name().as_ref() == b"worksheet" => {
                write_data_validations(&mut writer, validations)?;
                written = true;
            }
            Event::Eof => break,
            _ => {}
        }

        if pass_through {
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
            writer.write_event(event)?;
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn write_data_validations(
    writer: &mut Writer<Vec<u8>>,
    validations: &[ListValidation],
) -> XlsxResult<()> {
    if validations.is_empty() {
        return Ok(());
    }

    let count = validations.len().to_string();
    writer.write_event(Event::Start(
        BytesStart::new("dataValidations").with_attributes([("count", count.as_str())]),
    ))?;
    for validation in validations {
        let allow_blank = if validation.allow_blank { "1" } else { "0" };
        writer.write_event(Event::Start(BytesStart::new("dataValidation").with_attributes([
            ("type", "list"),
            ("allowBlank", allow_blank),
            ("sqref", validation.sqref.as_str()),
        ])))?;
        writer
            .create_element("formula1")
            .write_text_content(BytesText::new(&validation.formula))?;
        writer.write_event(Event::End(BytesEnd::new("dataValidation")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("dataValidations")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use refbook_core::{DefinedName, ReferenceDataColumn};

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    fn list(sqref: &str, formula: &str) -> ListValidation {
        ListValidation {
            sqref: sqref.into(),
            formula: formula.into(),
            allow_blank: true,
        }
    }

    #[test]
    fn test_reference_data_xml() {
        let update = WorkbookUpdate {
            reference_data: vec![
                ReferenceDataColumn {
                    index: 2,
                    keys: vec!["x".into()],
                },
                ReferenceDataColumn {
                    index: 0,
                    keys: vec!["a&b".into(), "c".into()],
                },
            ],
            ..Default::default()
        };
        let xml = text(reference_data_xml(&update).unwrap());
        assert!(xml.contains(
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t xml:space="preserve">a&amp;b</t></is></c><c r="C1" t="inlineStr"><is><t xml:space="preserve">x</t></is></c></row>"#
        ));
        assert!(xml.contains(
            r#"<row r="2"><c r="A2" t="inlineStr"><is><t xml:space="preserve">c</t></is></c></row>"#
        ));
    }

    #[test]
    fn test_rewrite_workbook_defined_names() {
        let xml = br#"<workbook><sheets><sheet name="Items" sheetId="1" r:id="rId1"/></sheets><definedNames><definedName name="_xlnm._FilterDatabase" localSheetId="0" hidden="1">Items!$A$1:$B$3</definedName><definedName name="old">Items!$A$1</definedName></definedNames><calcPr calcId="0"/></workbook>"#;
        let update = WorkbookUpdate {
            defined_names: vec![DefinedName {
                name: "status_ref".into(),
                refers_to: "_reference_data!$A$1:$A$2".into(),
            }],
            ..Default::default()
        };
        let entry = SheetEntry {
            name: REFERENCE_DATA_SHEET.into(),
            sheet_id: 2,
            rel_id: "rId9".into(),
            part: "xl/worksheets/sheet2.xml".into(),
        };

        let out = text(rewrite_workbook_xml(xml, &update, Some(&entry)).unwrap());

        assert_eq!(
            out,
            concat!(
                r#"<workbook><sheets><sheet name="Items" sheetId="1" r:id="rId1"/>"#,
                r#"<sheet name="_reference_data" sheetId="2" r:id="rId9"/></sheets>"#,
                r#"<definedNames><definedName name="_xlnm._FilterDatabase" localSheetId="0" hidden="1">Items!$A$1:$B$3</definedName>"#,
                r#"<definedName name="status_ref">_reference_data!$A$1:$A$2</definedName></definedNames>"#,
                r#"<calcPr calcId="0"/></workbook>"#,
            )
        );
    }

    #[test]
    fn test_defined_names_inserted_before_calc_pr() {
        let xml = br#"<workbook><sheets/><calcPr/></workbook>"#;
        let update = WorkbookUpdate {
            defined_names: vec![DefinedName {
                name: "n".into(),
                refers_to: "_reference_data!$A$1:$A$1".into(),
            }],
            ..Default::default()
        };
        let out = text(rewrite_workbook_xml(xml, &update, None).unwrap());
        assert_eq!(
            out,
            r#"<workbook><sheets/><definedNames><definedName name="n">_reference_data!$A$1:$A$1</definedName></definedNames><calcPr/></workbook>"#
        );
    }

    #[test]
    fn test_replace_data_validations() {
        let xml = br#"<worksheet><sheetData><row r="1"/></sheetData><dataValidations count="1"><dataValidation type="whole" sqref="A1"><formula1>1</formula1></dataValidation></dataValidations><pageMargins left="0.7"/></worksheet>"#;
        let out = text(
            rewrite_data_validations(xml, &[list("B4:B9999", "_reference_data!$A$1:$A$9999")])
                .unwrap(),
        );
        assert_eq!(
            out,
            concat!(
                r#"<worksheet><sheetData><row r="1"/></sheetData>"#,
                r#"<dataValidations count="1"><dataValidation type="list" allowBlank="1" sqref="B4:B9999">"#,
                r#"<formula1>_reference_data!$A$1:$A$9999</formula1></dataValidation></dataValidations>"#,
                r#"<pageMargins left="0.7"/></worksheet>"#,
            )
        );
    }

    #[test]
    fn test_insert_data_validations() {
        let xml = br#"<worksheet><sheetData/></worksheet>"#;
        let out = text(rewrite_data_validations(xml, &[list("D4:D9999", "INDIRECT($C4)")]).unwrap());
        assert_eq!(
            out,
            concat!(
                r#"<worksheet><sheetData/><dataValidations count="1">"#,
                r#"<dataValidation type="list" allowBlank="1" sqref="D4:D9999"><formula1>INDIRECT($C4)</formula1></dataValidation>"#,
                r#"</dataValidations></worksheet>"#,
            )
        );
    }
}
