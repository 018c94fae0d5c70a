//! XLSX reader

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use refbook_core::{CellAddress, StorageOpener, WorkbookStorage};

pub(crate) const WORKBOOK_PART: &str = "xl/workbook.xml";
pub(crate) const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
pub(crate) const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// `_x000d_` is CR, `_x000a_` is LF, `_x005f_` an escaped underscore.
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("_x") {
        result.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// A worksheet entry of `workbook.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: String,
    /// Part path inside the package, e.g. `xl/worksheets/sheet1.xml`
    pub part: String,
}

/// An opened `.xlsx` package
pub struct XlsxWorkbook {
    pub(crate) archive: zip::ZipArchive<Cursor<Vec<u8>>>,
    pub(crate) sheets: Vec<SheetEntry>,
    pub(crate) rel_ids: Vec<String>,
    shared_strings: Vec<String>,
}

impl XlsxWorkbook {
    /// Read a workbook from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Read a workbook from an in-memory package
    pub fn from_bytes(bytes: Vec<u8>) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

        // Verify this is an XLSX file
        if archive.by_name(CONTENT_TYPES_PART).is_err() {
            return Err(XlsxError::InvalidFormat(format!("Missing {}", CONTENT_TYPES_PART)));
        }

        let shared_strings = match read_part(&mut archive, SHARED_STRINGS_PART) {
            Ok(bytes) => read_shared_strings(&bytes)?,
            // No shared strings is valid
            Err(XlsxError::MissingPart(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let rels = read_workbook_rels(&read_part(&mut archive, WORKBOOK_RELS_PART)?)?;
        let sheets = read_workbook_sheets(&read_part(&mut archive, WORKBOOK_PART)?)?
            .into_iter()
            .filter_map(|(name, sheet_id, rel_id)| {
                let part = rels.get(&rel_id).filter(|p| !p.is_empty())?.clone();
                Some(SheetEntry {
                    name,
                    sheet_id,
                    rel_id,
                    part,
                })
            })
            .collect::<Vec<_>>();

        log::debug!("opened xlsx package with {} sheets", sheets.len());

        Ok(Self {
            archive,
            sheets,
            rel_ids: rels.into_keys().collect(),
            shared_strings,
        })
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Read every row of a sheet as strings.
    ///
    /// Missing rows come back empty and trailing empty cells are trimmed.
    /// Numbers are returned as stored, booleans as `TRUE`/`FALSE`.
    pub fn rows(&mut self, name: &str) -> XlsxResult<Vec<Vec<String>>> {
        let part = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.part.clone())
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?;
        let bytes = read_part(&mut self.archive, &part)?;
        read_worksheet_rows(&bytes, &self.shared_strings)
    }
}

impl WorkbookStorage for XlsxWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        XlsxWorkbook::sheet_names(self)
    }

    fn sheet_rows(&mut self, name: &str) -> refbook_core::Result<Vec<Vec<String>>> {
        Ok(self.rows(name)?)
    }
}

/// Opens reference workbooks from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxOpener;

impl StorageOpener for XlsxOpener {
    type Storage = XlsxWorkbook;

    fn open(&self, path: &Path) -> refbook_core::Result<XlsxWorkbook> {
        XlsxWorkbook::open(path)
            .map_err(|e| refbook_core::Error::source_open(path.display().to_string(), e))
    }
}

pub(crate) fn read_part<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> XlsxResult<Vec<u8>> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| XlsxError::MissingPart(name.to_string()))?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

pub(crate) fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|s| s.to_string()))
}

/// Read the shared strings table, skipping phonetic runs
fn read_shared_strings(bytes: &[u8]) -> XlsxResult<Vec<String>> {
    let mut xml_reader = Reader::from_reader(bytes);

    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"si" => strings.push(decode_excel_escapes(&current)),
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_t => current.push_str(&e.unescape()?),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Read `(name, sheetId, r:id)` for every sheet in `workbook.xml`
fn read_workbook_sheets(bytes: &[u8]) -> XlsxResult<Vec<(String, u32, String)>> {
    let mut xml_reader = Reader::from_reader(bytes);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                let name = attr_value(&e, b"name");
                let sheet_id = attr_value(&e, b"sheetId").and_then(|s| s.parse().ok());
                let r_id = attr_value(&e, b"r:id");
                if let (Some(name), Some(r_id)) = (name, r_id) {
                    sheets.push((name, sheet_id.unwrap_or(0), r_id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Read `workbook.xml.rels` into relationship id -> worksheet part path
fn read_workbook_rels(bytes: &[u8]) -> XlsxResult<HashMap<String, String>> {
    let mut xml_reader = Reader::from_reader(bytes);
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id");
                let target = attr_value(&e, b"Target");
                let rel_type = attr_value(&e, b"Type").unwrap_or_default();
                if let (Some(id), Some(target)) = (id, target) {
                    // Target is relative to the xl/ folder
                    let part = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    };
                    // other relationships only reserve their id
                    let part = if rel_type.ends_with("/worksheet") {
                        part
                    } else {
                        String::new()
                    };
                    rels.insert(id, part);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

#[derive(Default)]
struct CellState {
    col: usize,
    kind: Option<String>,
    value: String,
    has_value: bool,
}

impl CellState {
    fn text(&self, shared_strings: &[String]) -> XlsxResult<String> {
        if !self.has_value {
            return Ok(String::new());
        }
        let text = match self.kind.as_deref() {
            // Shared string
            Some("s") => {
                let idx: usize = self.value.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", self.value))
                })?;
                shared_strings.get(idx).cloned().ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?
            }
            // Boolean
            Some("b") => {
                if self.value == "1" || self.value.eq_ignore_ascii_case("true") {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            Some("inlineStr") | Some("str") => decode_excel_escapes(&self.value),
            // Numbers, errors and anything else keep their stored text
            _ => self.value.clone(),
        };
        Ok(text)
    }
}

/// Read a worksheet part into rows of strings
fn read_worksheet_rows(bytes: &[u8], shared_strings: &[String]) -> XlsxResult<Vec<Vec<String>>> {
    let mut xml_reader = Reader::from_reader(bytes);

    let mut buf = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row_idx = 0usize;
    let mut next_col = 0usize;
    let mut cell: Option<CellState> = None;
    let mut in_value = false;
    let mut in_inline_text = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"row" => {
                    row_idx = row_index(&e, row_idx);
                    next_col = 0;
                }
                b"c" => {
                    let col = cell_column(&e, next_col)?;
                    cell = Some(CellState {
                        col,
                        kind: attr_value(&e, b"t"),
                        ..Default::default()
                    });
                }
                b"v" if cell.is_some() => in_value = true,
                b"t" if cell.is_some() => in_inline_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                // a self-closing row has no end event
                b"row" => row_idx = row_index(&e, row_idx) + 1,
                b"c" => next_col = cell_column(&e, next_col)? + 1,
                _ => {}
            },
            Ok(Event::Text(e)) if in_value || in_inline_text => {
                if let Some(state) = cell.as_mut() {
                    state.value.push_str(&e.unescape()?);
                    state.has_value = true;
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"v" => in_value = false,
                b"t" => in_inline_text = false,
                b"c" => {
                    if let Some(state) = cell.take() {
                        next_col = state.col + 1;
                        let text = state.text(shared_strings)?;
                        if !text.is_empty() {
                            if rows.len() <= row_idx {
                                rows.resize_with(row_idx + 1, Vec::new);
                            }
                            let row = &mut rows[row_idx];
                            if row.len() <= state.col {
                                row.resize(state.col + 1, String::new());
                            }
                            row[state.col] = text;
                        }
                    }
                }
                b"row" => row_idx += 1,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

/// 0-based row index from `<row r="..">`, or the next row when absent
fn row_index(e: &BytesStart, fallback: usize) -> usize {
    attr_value(e, b"r")
        .and_then(|r| r.parse::<usize>().ok())
        .map_or(fallback, |r| r.saturating_sub(1))
}

/// 0-based column from `<c r="..">`, or the next column when absent
fn cell_column(e: &BytesStart, fallback: usize) -> XlsxResult<usize> {
    match attr_value(e, b"r") {
        Some(reference) => CellAddress::parse(&reference)
            .map(|addr| addr.col as usize)
            .map_err(|err| {
                XlsxError::Parse(format!("Invalid cell reference '{}': {}", reference, err))
            }),
        None => Ok(fallback),
    }
}
