//! Minimal xlsx reader
//!
//! An `.xlsx` workbook is a ZIP archive of XML parts. Only what schema
//! extraction needs is read: sheet names and order, shared strings, cell
//! number formats, and the cell values of each worksheet.
//!
//! Numeric cells whose format is a date or time are rendered as
//! `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `HH:MM:SS` so they infer like
//! dates from any other source.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use chrono::{Days, NaiveDate, NaiveTime};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::tabular::Sheet;
use super::{ImportError, ImportResult};

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

fn read_part(archive: &mut Archive<'_>, name: &str) -> ImportResult<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ImportError::Workbook(format!("Failed to open {}: {}", name, e))),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| ImportError::Workbook(format!("Failed to read {}: {}", name, e)))?;
    Ok(Some(xml))
}

fn xml_error(part: &str, reader: &Reader<&[u8]>, e: quick_xml::Error) -> ImportError {
    ImportError::Workbook(format!(
        "XML error in {} at position {}: {}",
        part,
        reader.error_position(),
        e
    ))
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == local)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

/// `(sheet name, relationship id)` in workbook order
fn sheet_entries(xml: &str) -> ImportResult<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut sheets = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                if let (Some(name), Some(rid)) = (attribute(e, b"name"), attribute(e, b"id")) {
                    sheets.push((name, rid));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("xl/workbook.xml", &reader, e)),
            _ => {}
        }
    }
    Ok(sheets)
}

/// Relationship id → archive path of its target
fn relationships(xml: &str) -> ImportResult<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attribute(e, b"Id"), attribute(e, b"Target")) {
                    let path = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    };
                    targets.insert(id, path);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("xl/_rels/workbook.xml.rels", &reader, e)),
            _ => {}
        }
    }
    Ok(targets)
}

fn shared_strings(xml: &str) -> ImportResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(ref t)) if in_text && !in_phonetic => {
                let text = t
                    .unescape()
                    .map_err(|e| xml_error("xl/sharedStrings.xml", &reader, e))?;
                current.push_str(&text);
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("xl/sharedStrings.xml", &reader, e)),
            _ => {}
        }
    }
    Ok(strings)
}

/// Whether a number format code shows a date or time
///
/// Quoted literals, escaped characters and bracketed sections such as
/// `[Red]` or `[$-409]` are ignored.
fn is_date_format(code: &str) -> bool {
    let mut chars = code.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '[' => {
                for q in chars.by_ref() {
                    if q == ']' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            c if matches!(c.to_ascii_lowercase(), 'y' | 'm' | 'd' | 'h' | 's') => return true,
            _ => {}
        }
    }
    false
}

/// Built-in number formats that show dates or times
fn is_builtin_date_format(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

/// Date flag per cell style index, from `xl/styles.xml`
fn date_styles(xml: &str) -> ImportResult<Vec<bool>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut formats: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attribute(e, b"numFmtId").and_then(|v| v.parse().ok());
                    if let (Some(id), Some(code)) = (id, attribute(e, b"formatCode")) {
                        custom.insert(id, code);
                    }
                }
                b"xf" if in_cell_xfs => {
                    formats.push(
                        attribute(e, b"numFmtId")
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(0),
                    );
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error("xl/styles.xml", &reader, e)),
            _ => {}
        }
    }

    Ok(formats
        .into_iter()
        .map(|id| match custom.get(&id) {
            Some(code) => is_date_format(code),
            None => is_builtin_date_format(id),
        })
        .collect())
}

/// Render a 1900-system serial date (epoch 1899-12-30)
fn serial_to_datetime(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let total = (serial * 86_400.0).round() as u64;
    let (days, seconds) = (total / 86_400, (total % 86_400) as u32);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)?;
    if days == 0 {
        return Some(time.format("%H:%M:%S").to_string());
    }
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))?;
    Some(if seconds == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string()
    })
}

/// Columns in a worksheet (`A` through `XFD`)
const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index from a cell reference such as `AB12`
///
/// `None` for references without letters or past column `XFD`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut idx = 0usize;
    for b in letters {
        idx = idx
            .checked_mul(26)?
            .checked_add((b.to_ascii_uppercase() - b'A' + 1) as usize)?;
        if idx > MAX_COLUMNS {
            return None;
        }
    }
    Some(idx - 1)
}

/// Cell being read: column, `t` and `s` attributes, collected text
struct PendingCell {
    column: usize,
    kind: Option<String>,
    style: usize,
    text: String,
}

/// Shared workbook parts needed to resolve cell values
#[derive(Default)]
struct CellContext {
    strings: Vec<String>,
    date_styles: Vec<bool>,
}

impl CellContext {
    fn is_date_style(&self, style: usize) -> bool {
        self.date_styles.get(style).copied().unwrap_or(false)
    }
}

fn resolve_cell(cell: PendingCell, ctx: &CellContext) -> Option<String> {
    let strings = &ctx.strings;
    let text = cell.text;
    match cell.kind.as_deref() {
        Some("s") => text
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| strings.get(idx).cloned()),
        Some("b") => Some(if text.trim() == "1" { "true" } else { "false" }.to_string()),
        _ if text.is_empty() => None,
        None | Some("n") if ctx.is_date_style(cell.style) => Some(
            text.trim()
                .parse::<f64>()
                .ok()
                .and_then(serial_to_datetime)
                .unwrap_or(text),
        ),
        _ => Some(text),
    }
}

fn worksheet_rows(
    part: &str,
    xml: &str,
    ctx: &CellContext,
) -> ImportResult<Vec<Vec<Option<String>>>> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut row: Option<Vec<Option<String>>> = None;
    let mut cell: Option<PendingCell> = None;
    let mut capture = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"row" => row = Some(Vec::new()),
                b"c" => {
                    let next = row.as_ref().map_or(0, |r| r.len());
                    let column = attribute(e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next);
                    cell = Some(PendingCell {
                        column,
                        kind: attribute(e, b"t"),
                        style: attribute(e, b"s")
                            .and_then(|s| s.parse().ok())
                            .unwrap_or(0),
                        text: String::new(),
                    });
                }
                b"v" | b"t" => capture = cell.is_some(),
                _ => {}
            },
            Ok(Event::Text(ref t)) if capture => {
                let text = t.unescape().map_err(|e| xml_error(part, &reader, e))?;
                if let Some(c) = cell.as_mut() {
                    c.text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => capture = false,
                b"c" => {
                    if let (Some(done), Some(r)) = (cell.take(), row.as_mut()) {
                        let column = done.column;
                        let value = resolve_cell(done, ctx);
                        if r.len() <= column {
                            r.resize(column + 1, None);
                        }
                        r[column] = value;
                    }
                }
                b"row" => {
                    if let Some(r) = row.take() {
                        rows.push(r);
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"row" => {
                rows.push(Vec::new());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, &reader, e)),
            _ => {}
        }
    }
    Ok(rows)
}

/// Read every worksheet of an xlsx workbook, in workbook order
pub fn read_workbook(content: &[u8]) -> ImportResult<Vec<Sheet>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))
        .map_err(|e| ImportError::Workbook(format!("Not a readable workbook archive: {}", e)))?;

    let workbook = read_part(&mut archive, "xl/workbook.xml")?
        .ok_or_else(|| ImportError::Workbook("Missing xl/workbook.xml".to_string()))?;
    let rels = match read_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
        Some(xml) => relationships(&xml)?,
        None => HashMap::new(),
    };
    let mut ctx = CellContext::default();
    if let Some(xml) = read_part(&mut archive, "xl/sharedStrings.xml")? {
        ctx.strings = shared_strings(&xml)?;
    }
    if let Some(xml) = read_part(&mut archive, "xl/styles.xml")? {
        ctx.date_styles = date_styles(&xml)?;
    }

    let mut sheets = Vec::new();
    for (position, (name, rid)) in sheet_entries(&workbook)?.into_iter().enumerate() {
        let part = rels
            .get(&rid)
            .cloned()
            .unwrap_or_else(|| format!("xl/worksheets/sheet{}.xml", position + 1));

        let Some(xml) = read_part(&mut archive, &part)? else {
            tracing::warn!("Worksheet part {} for sheet '{}' is missing", part, name);
            continue;
        };

        let mut sheet = Sheet::new(name);
        sheet.rows = worksheet_rows(&part, &xml, &ctx)?;
        sheets.push(sheet);
    }

    Ok(sheets)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! In-memory xlsx builder for tests

    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    fn column_letter(idx: usize) -> String {
        let mut n = idx + 1;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        out.reverse();
        String::from_utf8(out).unwrap()
    }

    /// Zip the given `(path, xml)` parts
    pub fn build_archive(parts: &[(String, String)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default();
        for (path, xml) in parts {
            zip.start_file(path.as_str(), options).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        buf.into_inner()
    }

    /// Build an xlsx from `(sheet name, rows)`; numeric-looking cells are
    /// written as numbers, everything else as inline strings
    pub fn build_xlsx(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
        build_xlsx_parts(sheets, Vec::new())
    }

    /// Like [`build_xlsx`], with extra parts such as `xl/styles.xml`;
    /// cells written as `value|style` carry that `s` attribute
    pub fn build_xlsx_parts(
        sheets: &[(&str, Vec<Vec<&str>>)],
        mut parts: Vec<(String, String)>,
    ) -> Vec<u8> {
        let mut workbook = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
        );
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for (idx, (name, rows)) in sheets.iter().enumerate() {
            workbook.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape(name),
                idx + 1,
                idx + 1
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                idx + 1,
                idx + 1
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
                    let reference = format!("{}{}", column_letter(c), r + 1);
                    if let Some((number, style)) = value.split_once('|') {
                        sheet.push_str(&format!(
                            r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                            reference, style, number
                        ));
                    } else if value.parse::<f64>().is_ok() {
                        sheet.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, value));
                    } else {
                        sheet.push_str(&format!(
                            r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                            reference,
                            escape(value)
                        ));
                    }
                }
                sheet.push_str("</row>");
            }
            sheet.push_str("</sheetData></worksheet>");
            parts.push((format!("xl/worksheets/sheet{}.xml", idx + 1), sheet));
        }

        workbook.push_str("</sheets></workbook>");
        rels.push_str("</Relationships>");
        parts.push(("xl/workbook.xml".to_string(), workbook));
        parts.push(("xl/_rels/workbook.xml.rels".to_string(), rels));

        build_archive(&parts)
    }

    /// Styles part whose cell styles are: 0 General, 1 built-in `m/d/yyyy`,
    /// 2 custom `dd/mm/yyyy hh:mm`, 3 custom `0.00"d"`
    pub fn date_styles_xml() -> (String, String) {
        (
            "xl/styles.xml".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="2"><numFmt numFmtId="164" formatCode="dd/mm/yyyy\ hh:mm"/><numFmt numFmtId="165" formatCode="0.00&quot;d&quot;"/></numFmts><cellStyleXfs count="1"><xf numFmtId="14"/></cellStyleXfs><cellXfs count="4"><xf numFmtId="0" xfId="0"/><xf numFmtId="14" xfId="0" applyNumberFormat="1"/><xf numFmtId="164" xfId="0" applyNumberFormat="1"><alignment horizontal="left"/></xf><xf numFmtId="165" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#
                .to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AB12"), Some(27));
        assert_eq!(column_index("12"), None);
        assert_eq!(column_index("XFD1"), Some(16_383));
        assert_eq!(column_index("XFE1"), None);
        assert_eq!(column_index("ZZZZZZZZZZZZZZZZZZZZ1"), None);
    }

    #[test]
    fn test_shared_strings_with_rich_runs() {
        let xml = r#"<sst><si><t>plain</t></si><si><r><t>ri</t></r><r><t>ch</t></r></si><si/></sst>"#;
        let strings = shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["plain", "rich", ""]);
    }

    #[test]
    fn test_worksheet_cells_with_gaps() {
        let ctx = CellContext {
            strings: vec!["nome".to_string()],
            ..Default::default()
        };
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1" t="inlineStr"><is><t>ativo</t></is></c></row>
            <row r="2"><c r="A2" t="str"><v>Mesa</v></c><c r="C2" t="b"><v>1</v></c></row>
        </sheetData></worksheet>"#;
        let rows = worksheet_rows("sheet1.xml", xml, &ctx).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![Some("nome".into()), None, Some("ativo".into())]);
        assert_eq!(rows[1][2].as_deref(), Some("true"));
    }

    #[test]
    fn test_read_workbook_roundtrip() {
        let bytes = fixtures::build_xlsx(&[
            ("Clientes", vec![vec!["id", "nome"], vec!["1", "Ana"]]),
            ("Vazio", vec![]),
        ]);
        let sheets = read_workbook(&bytes).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "Clientes");
        assert_eq!(sheets[0].rows[1][1].as_deref(), Some("Ana"));
        assert!(sheets[1].rows.is_empty());
    }

    #[test]
    fn test_date_format_detection() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("[$-409]d-mmm-yy;@"));
        assert!(!is_date_format("0.00"));
        assert!(!is_date_format("#,##0\"d\""));
        assert!(!is_date_format("[Red]0.00"));
        assert!(!is_date_format("General"));
        assert!(is_builtin_date_format(14));
        assert!(is_builtin_date_format(47));
        assert!(!is_builtin_date_format(2));
    }

    #[test]
    fn test_date_styles_only_count_cell_xfs() {
        let (_, xml) = fixtures::date_styles_xml();
        assert_eq!(date_styles(&xml).unwrap(), vec![false, true, true, false]);
    }

    #[test]
    fn test_serial_to_datetime() {
        assert_eq!(serial_to_datetime(44931.0).as_deref(), Some("2023-01-05"));
        assert_eq!(serial_to_datetime(44931.5).as_deref(), Some("2023-01-05 12:00:00"));
        assert_eq!(serial_to_datetime(0.25).as_deref(), Some("06:00:00"));
        assert_eq!(serial_to_datetime(-1.0), None);
    }

    #[test]
    fn test_date_styled_cells_render_as_dates() {
        let bytes = fixtures::build_xlsx_parts(
            &[(
                "Pedidos",
                vec![
                    vec!["id", "emitido", "entregue", "dias"],
                    vec!["1", "44931|1", "44931.5|2", "3|3"],
                    vec!["2", "44932|1", "44933|2", "4|0"],
                ],
            )],
            vec![fixtures::date_styles_xml()],
        );
        let sheets = read_workbook(&bytes).unwrap();
        let rows = &sheets[0].rows;
        assert_eq!(rows[1][1].as_deref(), Some("2023-01-05"));
        assert_eq!(rows[1][2].as_deref(), Some("2023-01-05 12:00:00"));
        assert_eq!(rows[1][3].as_deref(), Some("3"));
        assert_eq!(rows[2][2].as_deref(), Some("2023-01-07"));
        assert_eq!(rows[2][3].as_deref(), Some("4"));
    }

    #[test]
    fn test_garbage_is_workbook_error() {
        let err = read_workbook(b"not a zip").unwrap_err();
        assert!(matches!(err, ImportError::Workbook(_)));
    }
}
