//! CSV codec

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{unique_names, CellType, CellValue, Column, Table};

use super::{Codec, FormatTag};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Field spellings read as a missing value
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

/// Codec for delimited text with a header row
pub struct CsvCodec;

impl Codec for CsvCodec {
    fn format(&self) -> FormatTag {
        FormatTag::Csv
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("csv")
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = csv_reader
            .headers()
            .map_err(|e| Error::decode(FormatTag::Csv, format!("failed to read header: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(Error::decode(FormatTag::Csv, "no columns to parse from file"));
        }

        let width = headers.len();
        let mut raw_rows: Vec<Vec<String>> = Vec::new();

        for result in csv_reader.records() {
            let record = result.map_err(|e| Error::decode(FormatTag::Csv, e.to_string()))?;

            if record.len() > width {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(Error::decode(
                    FormatTag::Csv,
                    format!("line {}: expected {} fields, saw {}", line, width, record.len()),
                ));
            }

            // Short rows are padded with missing values
            let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
            fields.resize(width, String::new());
            raw_rows.push(fields);
        }

        let mut rows: Vec<Vec<CellValue>> = raw_rows
            .iter()
            .map(|fields| fields.iter().map(|s| parse_cell_value(s)).collect())
            .collect();

        demote_mixed_columns(&mut rows, &raw_rows, width);

        let columns = unique_names(headers.iter())
            .into_iter()
            .map(Column::new)
            .collect();
        let mut table = Table::new(columns);
        for cells in rows {
            table.add_row(cells);
        }
        table.infer_column_types();

        debug!(
            rows = table.row_count(),
            columns = table.column_count(),
            "decoded csv"
        );
        Ok(table)
    }

    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        // No header means no rows either
        if table.column_count() == 0 {
            return Ok(Vec::new());
        }

        let encode_err = |e: csv::Error| Error::encode(FormatTag::Csv, e.to_string());
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(table.columns.iter().map(|c| c.name.as_str()))
            .map_err(encode_err)?;

        for row in &table.rows {
            writer
                .write_record(row.cells.iter().map(|c| c.display().into_owned()))
                .map_err(encode_err)?;
        }

        writer
            .into_inner()
            .map_err(|e| Error::encode(FormatTag::Csv, e.to_string()))
    }
}

/// Parse a field into a typed value
fn parse_cell_value(s: &str) -> CellValue {
    // Markers match exactly; a field of spaces is text
    if MISSING_MARKERS.contains(&s) {
        return CellValue::Null;
    }

    let trimmed = s.trim();
    if trimmed.is_empty() {
        return CellValue::String(s.to_string());
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return CellValue::Date(date);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return CellValue::DateTime(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return CellValue::DateTime(dt);
    }

    CellValue::String(s.to_string())
}

/// A column whose field types do not widen to one type is read as text,
/// keeping every present field exactly as written.
fn demote_mixed_columns(rows: &mut [Vec<CellValue>], raw_rows: &[Vec<String>], width: usize) {
    for col_idx in 0..width {
        let widened = rows
            .iter()
            .fold(CellType::Null, |acc, row| acc.widen(row[col_idx].cell_type()));

        if widened != CellType::Mixed {
            continue;
        }

        for (row, raw) in rows.iter_mut().zip(raw_rows) {
            if !row[col_idx].is_null() {
                row[col_idx] = CellValue::String(raw[col_idx].clone());
            }
        }
    }
}
