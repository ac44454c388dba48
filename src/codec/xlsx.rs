//! Minimal single-sheet xlsx writer
//!
//! Produces the OOXML parts a spreadsheet reader needs: content types,
//! package and workbook relationships, the workbook, one worksheet, a shared
//! string table and a style sheet with date and datetime number formats.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexSet;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::model::{CellValue, Table};

use super::FormatTag;

/// Worksheet limits, header row included
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;
const MAX_CELL_CHARS: usize = 32_767;

/// Indices into `cellXfs` of the style sheet below
const STYLE_DATE: u8 = 1;
const STYLE_DATETIME: u8 = 2;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd hh:mm:ss"/></numFmts><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/><xf numFmtId="164" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

const SHEET_HEAD: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData>"#;

const SHEET_TAIL: &str = "</sheetData></worksheet>";

/// Serialize a table as a workbook with a single sheet named `Sheet1`
pub fn write_workbook(table: &Table) -> Result<Vec<u8>> {
    if table.row_count() + 1 > MAX_ROWS {
        return Err(Error::encode(
            FormatTag::Excel,
            format!(
                "{} rows exceed the worksheet limit of {}",
                table.row_count(),
                MAX_ROWS - 1
            ),
        ));
    }
    if table.column_count() > MAX_COLUMNS {
        return Err(Error::encode(
            FormatTag::Excel,
            format!(
                "{} columns exceed the worksheet limit of {}",
                table.column_count(),
                MAX_COLUMNS
            ),
        ));
    }

    let mut strings = SharedStrings::default();
    let sheet = write_sheet(table, &mut strings)?;
    let shared = strings.to_xml();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &str); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/styles.xml", STYLES),
        ("xl/sharedStrings.xml", shared.as_str()),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ];

    for (name, content) in parts {
        zip.start_file(name, options)
            .map_err(|e| Error::encode(FormatTag::Excel, format!("{}: {}", name, e)))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| Error::encode(FormatTag::Excel, format!("{}: {}", name, e)))?;
    }

    let bytes = zip
        .finish()
        .map_err(|e| Error::encode(FormatTag::Excel, e.to_string()))?
        .into_inner();

    debug!(
        bytes = bytes.len(),
        strings = strings.len(),
        "encoded workbook"
    );
    Ok(bytes)
}

/// Shared string table, indexed in insertion order
#[derive(Default)]
struct SharedStrings {
    strings: IndexSet<String>,
    references: usize,
}

impl SharedStrings {
    fn intern(&mut self, s: &str) -> usize {
        self.references += 1;
        match self.strings.get_index_of(s) {
            Some(idx) => idx,
            None => self.strings.insert_full(s.to_string()).0,
        }
    }

    fn len(&self) -> usize {
        self.strings.len()
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
"#,
        );
        let _ = write!(
            xml,
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.references,
            self.strings.len()
        );
        for s in &self.strings {
            xml.push_str(r#"<si><t xml:space="preserve">"#);
            escape_into(&mut xml, s);
            xml.push_str("</t></si>");
        }
        xml.push_str("</sst>");
        xml
    }
}

fn write_sheet(table: &Table, strings: &mut SharedStrings) -> Result<String> {
    let mut xml = String::from(SHEET_HEAD);

    xml.push_str(r#"<row r="1">"#);
    for (col_idx, column) in table.columns.iter().enumerate() {
        let cell = CellValue::String(column.name.clone());
        write_cell(&mut xml, strings, 1, col_idx, &cell)?;
    }
    xml.push_str("</row>");

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_number = row_idx + 2;
        let _ = write!(xml, r#"<row r="{}">"#, row_number);
        if !row.cells.is_empty() && row.cells.iter().all(CellValue::is_null) {
            // An empty string keeps the row inside the sheet's used range;
            // readers take it back as missing
            let idx = strings.intern("");
            let _ = write!(xml, r#"<c r="A{}" t="s"><v>{}</v></c>"#, row_number, idx);
        } else {
            for (col_idx, cell) in row.cells.iter().enumerate() {
                write_cell(&mut xml, strings, row_number, col_idx, cell)?;
            }
        }
        xml.push_str("</row>");
    }

    xml.push_str(SHEET_TAIL);
    Ok(xml)
}

fn write_cell(
    xml: &mut String,
    strings: &mut SharedStrings,
    row_number: usize,
    col_idx: usize,
    cell: &CellValue,
) -> Result<()> {
    let reference = format!("{}{}", column_letters(col_idx), row_number);

    match cell {
        CellValue::Null => {}
        CellValue::Bool(b) => {
            let _ = write!(xml, r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, u8::from(*b));
        }
        CellValue::Int(i) => {
            let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, reference, i);
        }
        CellValue::Float(f) => {
            if !f.is_finite() {
                return Err(Error::encode(
                    FormatTag::Excel,
                    format!("cell {} holds {}, which a workbook cannot store", reference, f),
                ));
            }
            let _ = write!(xml, r#"<c r="{}"><v>{}</v></c>"#, reference, f);
        }
        CellValue::String(s) => {
            check_text(s, &reference)?;
            let idx = strings.intern(s);
            let _ = write!(xml, r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, idx);
        }
        CellValue::Date(d) => {
            let serial = date_serial(d.and_time(chrono::NaiveTime::MIN), &reference)?;
            let _ = write!(
                xml,
                r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                reference, STYLE_DATE, serial
            );
        }
        CellValue::DateTime(dt) => {
            let serial = date_serial(*dt, &reference)?;
            let _ = write!(
                xml,
                r#"<c r="{}" s="{}"><v>{}</v></c>"#,
                reference, STYLE_DATETIME, serial
            );
        }
    }

    Ok(())
}

fn check_text(s: &str, reference: &str) -> Result<()> {
    if s.chars().count() > MAX_CELL_CHARS {
        return Err(Error::encode(
            FormatTag::Excel,
            format!(
                "cell {} exceeds the {} character limit",
                reference, MAX_CELL_CHARS
            ),
        ));
    }
    if s
        .chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
    {
        return Err(Error::encode(
            FormatTag::Excel,
            format!("cell {} contains a control character", reference),
        ));
    }
    Ok(())
}

/// Excel serial number of a timestamp in the 1900 date system.
///
/// Serials below 61 are shifted by one day to account for the fictitious
/// 1900-02-29 the 1900 system counts.
fn date_serial(dt: NaiveDateTime, reference: &str) -> Result<f64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::encode(FormatTag::Excel, "invalid epoch"))?;

    let millis = (dt - epoch).num_milliseconds() as f64;
    let serial = millis / 86_400_000.0;

    if serial < 2.0 {
        return Err(Error::encode(
            FormatTag::Excel,
            format!("cell {} holds {}, before the first workbook date", reference, dt),
        ));
    }

    Ok(if serial < 61.0 { serial - 1.0 } else { serial })
}

/// Column letters for a zero-based index: 0 -> A, 25 -> Z, 26 -> AA
fn column_letters(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(c),
        }
    }
}
