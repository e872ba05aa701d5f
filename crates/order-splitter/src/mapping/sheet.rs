//! Decoding of the lookup sheet into a header row plus string cells.
//!
//! Two formats are accepted and told apart by content, not extension:
//! XLSX workbooks (a zip archive, first worksheet in workbook order) and
//! UTF-8 CSV text.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SchemaError;

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";
const FALLBACK_WORKSHEET: &str = "xl/worksheets/sheet1.xml";

/// Column count of an Excel worksheet; the last column is `XFD`.
const MAX_COLUMNS: usize = 16_384;

/// A decoded sheet. `rows` excludes the header row; short rows are not padded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Cell value at `column` in `row`, empty when the row is short.
pub fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(String::as_str).unwrap_or("")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_SIGNATURE) {
            SheetFormat::Xlsx
        } else {
            SheetFormat::Csv
        }
    }
}

pub fn read_sheet(bytes: &[u8]) -> Result<Sheet, SchemaError> {
    match SheetFormat::detect(bytes) {
        SheetFormat::Xlsx => read_xlsx(bytes),
        SheetFormat::Csv => read_csv(bytes),
    }
}

pub fn read_csv(bytes: &[u8]) -> Result<Sheet, SchemaError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SchemaError::ReadSheet(format!("CSV is not valid UTF-8: {}", e)))?;
    let text = text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SchemaError::ReadSheet(format!("Failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| SchemaError::ReadSheet(format!("Failed to read CSV row: {}", e)))?;
        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    Ok(Sheet { headers, rows })
}

pub fn read_xlsx(bytes: &[u8]) -> Result<Sheet, SchemaError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| SchemaError::ReadSheet(format!("Failed to open XLSX: {}", e)))?;

    let shared_strings = match read_entry(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let worksheet_path = first_worksheet_path(&mut archive)?;
    let worksheet = read_entry(&mut archive, &worksheet_path)?.ok_or_else(|| {
        SchemaError::ReadSheet(format!("Worksheet '{}' missing from XLSX", worksheet_path))
    })?;

    let mut grid = parse_worksheet(&worksheet, &shared_strings)?.into_iter();
    let headers = grid.next().unwrap_or_default();
    let rows = grid.collect();

    Ok(Sheet { headers, rows })
}

fn read_entry<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, SchemaError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(SchemaError::ReadSheet(format!(
                "Failed to open '{}': {}",
                name, e
            )))
        }
    };

    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| SchemaError::ReadSheet(format!("Failed to read '{}': {}", name, e)))?;
    Ok(Some(content))
}

/// Resolves the part name of the first `<sheet>` in `xl/workbook.xml`
/// through the workbook relationships.
fn first_worksheet_path<R: Read + Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<String, SchemaError> {
    let Some(workbook) = read_entry(archive, "xl/workbook.xml")? else {
        return Ok(FALLBACK_WORKSHEET.to_string());
    };
    let Some(rel_id) = first_attribute_of(&workbook, b"sheet", b"id")? else {
        return Ok(FALLBACK_WORKSHEET.to_string());
    };
    let Some(rels) = read_entry(archive, "xl/_rels/workbook.xml.rels")? else {
        return Ok(FALLBACK_WORKSHEET.to_string());
    };

    let mut reader = Reader::from_str(&rels);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if attribute(e, b"Id").as_deref() == Some(rel_id.as_str()) {
                    if let Some(target) = attribute(e, b"Target") {
                        return Ok(resolve_part_name(&target));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("workbook.xml.rels", e)),
            _ => {}
        }
    }

    Ok(FALLBACK_WORKSHEET.to_string())
}

fn resolve_part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn first_attribute_of(
    xml: &str,
    element: &[u8],
    key: &[u8],
) -> Result<Option<String>, SchemaError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == element =>
            {
                return Ok(attribute(e, key));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error("workbook.xml", e)),
            _ => {}
        }
    }
}

/// Attribute value by local name, so `r:id` matches `id`.
fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn xml_error(part: &str, e: quick_xml::Error) -> SchemaError {
    SchemaError::ReadSheet(format!("XML parsing error in {}: {}", part, e))
}

fn push_general_ref(target: &mut String, entity: &quick_xml::events::BytesRef<'_>) {
    if let Ok(Some(ch)) = entity.resolve_char_ref() {
        target.push(ch);
        return;
    }
    let name = String::from_utf8_lossy(entity);
    if let Some(resolved) = resolve_predefined_entity(&name) {
        target.push_str(resolved);
    }
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, SchemaError> {
    let mut reader = Reader::from_str(xml);

    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut in_text = false;
    // Phonetic runs (<rPh>) repeat the reading of the text and are skipped.
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                }
                b"t" => in_text = in_item && !in_phonetic,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_item = false;
                }
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                current.push_str(&e.decode().unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) if in_text => push_general_ref(&mut current, &e),
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("sharedStrings.xml", e)),
            _ => {}
        }
    }

    Ok(strings)
}

#[derive(Default)]
struct CellState {
    column: usize,
    kind: Option<String>,
    value: String,
}

/// Returns the worksheet as dense rows in document order. Row numbers are
/// not used: rows with no cells carry no mapping data.
fn parse_worksheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, SchemaError> {
    let mut reader = Reader::from_str(xml);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut current_row: Option<HashMap<usize, String>> = None;
    let mut next_column = 0usize;
    let mut cell: Option<CellState> = None;
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = Some(HashMap::new());
                    next_column = 0;
                }
                b"c" => {
                    let state = start_cell(e, next_column)?;
                    next_column = state.column + 1;
                    cell = Some(state);
                }
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"c" => {
                next_column = start_cell(e, next_column)?.column + 1;
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let (Some(state), Some(row)) = (cell.take(), current_row.as_mut()) {
                        let value = cell_value(&state, shared);
                        row.insert(state.column, value);
                    }
                }
                b"row" => {
                    if let Some(row) = current_row.take() {
                        rows.push(densify(row));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_value => {
                if let Some(state) = cell.as_mut() {
                    state.value.push_str(&e.decode().unwrap_or_default());
                }
            }
            Ok(Event::GeneralRef(e)) if in_value => {
                if let Some(state) = cell.as_mut() {
                    push_general_ref(&mut state.value, &e);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("worksheet", e)),
            _ => {}
        }
    }

    Ok(rows)
}

fn start_cell(e: &BytesStart<'_>, next_column: usize) -> Result<CellState, SchemaError> {
    let reference = attribute(e, b"r");
    let column = match reference.as_deref() {
        Some(r) if r.starts_with(|c: char| c.is_ascii_alphabetic()) => column_index(r),
        _ => Some(next_column),
    };
    let column = column.filter(|&c| c < MAX_COLUMNS).ok_or_else(|| {
        SchemaError::ReadSheet(format!(
            "Cell reference '{}' lies past the last worksheet column XFD",
            reference.as_deref().unwrap_or("")
        ))
    })?;

    Ok(CellState {
        column,
        kind: attribute(e, b"t"),
        value: String::new(),
    })
}

fn densify(row: HashMap<usize, String>) -> Vec<String> {
    let width = row.keys().max().map(|m| m + 1).unwrap_or(0);
    let mut dense = vec![String::new(); width];
    for (column, value) in row {
        dense[column] = value;
    }
    dense
}

fn cell_value(state: &CellState, shared: &[String]) -> String {
    match state.kind.as_deref() {
        Some("s") => state
            .value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i).cloned())
            .unwrap_or_default(),
        Some("inlineStr") | Some("str") => state.value.clone(),
        Some("b") => match state.value.trim() {
            "1" => "True".to_string(),
            "0" => "False".to_string(),
            other => other.to_string(),
        },
        Some("e") => String::new(),
        _ => format_number(&state.value),
    }
}

/// Renders a numeric cell the way it reads in the sheet: integral values
/// lose their fractional part so SKU `12345` never becomes `12345.0`.
pub fn format_number(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        _ => trimmed.to_string(),
    }
}

/// Zero-based column index from an A1-style reference (`"AB12"` → 27).
/// `None` when the reference has no letters or the index overflows.
pub fn column_index(reference: &str) -> Option<usize> {
    let letters: String = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        let digit = c.to_ascii_uppercase() as usize - 'A' as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn build_xlsx(shared: &str, sheet: &str) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            let parts = [
                (
                    "xl/workbook.xml",
                    r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Map" sheetId="1" r:id="rId7"/></sheets></workbook>"#,
                ),
                (
                    "xl/_rels/workbook.xml.rels",
                    r#"<Relationships><Relationship Id="rId7" Target="worksheets/mapping.xml"/></Relationships>"#,
                ),
                ("xl/sharedStrings.xml", shared),
                ("xl/worksheets/mapping.xml", sheet),
            ];
            for (name, body) in parts {
                zip.start_file(name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(SheetFormat::detect(b"PK\x03\x04rest"), SheetFormat::Xlsx);
        assert_eq!(SheetFormat::detect(b"SKU,Vendor\n"), SheetFormat::Csv);
        assert_eq!(SheetFormat::detect(b""), SheetFormat::Csv);
    }

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("C12"), Some(2));
        assert_eq!(column_index("Z3"), Some(25));
        assert_eq!(column_index("AA3"), Some(26));
        assert_eq!(column_index("ab9"), Some(27));
        assert_eq!(column_index("XFD1"), Some(MAX_COLUMNS - 1));
        assert_eq!(column_index("12"), None);
        assert_eq!(column_index("ZZZZZZZZZZZZZZZZZZZZ1"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("12345"), "12345");
        assert_eq!(format_number("12345.0"), "12345");
        assert_eq!(format_number(" 1.5 "), "1.5");
        assert_eq!(format_number("ABC"), "ABC");
    }

    #[test]
    fn test_read_csv_with_bom_and_short_rows() {
        let sheet = read_csv("\u{FEFF}SKU,Vendor,Email\nA100,VendorX\n".as_bytes()).unwrap();
        assert_eq!(sheet.headers, vec!["SKU", "Vendor", "Email"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(cell(&sheet.rows[0], 2), "");
    }

    #[test]
    fn test_read_xlsx_resolves_shared_and_inline_strings() {
        let shared = r#"<sst><si><t>SKU</t></si><si><t>Vendor</t></si><si><r><t>Acme</t></r><r><t xml:space="preserve"> &amp; Co</t></r></si></sst>"#;
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
            <row r="2"><c r="A2"><v>12345</v></c><c r="B2" t="s"><v>2</v></c></row>
            <row r="3"><c r="A3" t="inlineStr"><is><t>B200</t></is></c><c r="C3" t="s"><v>1</v></c></row>
        </sheetData></worksheet>"#;

        let parsed = read_xlsx(&build_xlsx(shared, sheet)).unwrap();
        assert_eq!(parsed.headers, vec!["SKU", "Vendor"]);
        assert_eq!(parsed.rows[0], vec!["12345", "Acme & Co"]);
        assert_eq!(parsed.rows[1], vec!["B200", "", "Vendor"]);
    }

    #[test]
    fn test_read_xlsx_rejects_column_past_xfd() {
        let shared = r#"<sst><si><t>SKU</t></si></sst>"#;
        for reference in ["XFE1", "ZZZZZZZZ1", "ZZZZZZZZZZZZZZZZZZZZ1"] {
            let sheet = format!(
                r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="{}" t="inlineStr"><is><t>Vendor</t></is></c></row></sheetData></worksheet>"#,
                reference
            );
            match read_xlsx(&build_xlsx(shared, &sheet)) {
                Err(SchemaError::ReadSheet(message)) => {
                    assert!(message.contains(reference), "{}", message)
                }
                other => panic!("Expected ReadSheet for {}, got {:?}", reference, other),
            }
        }
    }

    #[test]
    fn test_read_xlsx_accepts_last_column() {
        let shared = r#"<sst><si><t>SKU</t></si></sst>"#;
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="XFD1" t="s"><v>0</v></c></row></sheetData></worksheet>"#;

        let parsed = read_xlsx(&build_xlsx(shared, sheet)).unwrap();
        assert_eq!(parsed.headers.len(), MAX_COLUMNS);
        assert_eq!(parsed.headers[MAX_COLUMNS - 1], "SKU");
    }

    #[test]
    fn test_read_xlsx_rejects_garbage_zip() {
        let result = read_xlsx(b"PK\x03\x04 not really a zip");
        assert!(matches!(result, Err(SchemaError::ReadSheet(_))));
    }
}
