//! Excel codec (reads xlsx, xlsm, xls, ods; writes xlsx)

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{unique_names, CellValue, Column, Table};

use super::{xlsx, Codec, FormatTag};

/// Codec for spreadsheet workbooks
pub struct ExcelCodec;

impl Codec for ExcelCodec {
    fn format(&self) -> FormatTag {
        FormatTag::Excel
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "xlsx" | "xlsm" | "xls" | "ods")
    }

    fn decode(&self, bytes: &[u8]) -> Result<Table> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| Error::decode(FormatTag::Excel, format!("failed to open workbook: {}", e)))?;

        // Only the first sheet is read
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| Error::decode(FormatTag::Excel, "no sheets found in workbook"))?;

        let range: Range<Data> = workbook.worksheet_range(&sheet_name).map_err(|e| {
            Error::decode(
                FormatTag::Excel,
                format!("failed to read sheet {}: {}", sheet_name, e),
            )
        })?;

        let table = parse_range(&range);
        debug!(
            sheet = %sheet_name,
            rows = table.row_count(),
            columns = table.column_count(),
            "decoded workbook"
        );
        Ok(table)
    }

    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        xlsx::write_workbook(table)
    }
}

fn parse_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    // First row is header; a sheet without cells is an empty table
    let Some(header_row) = rows.next() else {
        return Table::default();
    };

    let columns: Vec<Column> = unique_names(header_row.iter().map(cell_to_string))
        .into_iter()
        .map(Column::new)
        .collect();

    let mut table = Table::new(columns);
    for row in rows {
        table.add_row(row.iter().map(convert_cell).collect());
    }

    // Workbook cells carry their own types, so the widening is taken as-is
    table.infer_column_types();
    table
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => datetime.to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Float(f) => {
            // Workbooks store every number as a float
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                CellValue::Int(*f as i64)
            } else {
                CellValue::Float(*f)
            }
        }
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return CellValue::Float(dt.as_f64());
            }
            match dt.as_datetime() {
                Some(datetime) => datetime_or_date(datetime),
                None => CellValue::Float(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) => {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                datetime_or_date(dt)
            } else if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                CellValue::Date(d)
            } else {
                CellValue::String(s.clone())
            }
        }
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

/// A timestamp at exact midnight is read as a plain date
fn datetime_or_date(dt: NaiveDateTime) -> CellValue {
    if dt.time() == NaiveTime::MIN {
        CellValue::Date(dt.date())
    } else {
        CellValue::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellType, ColumnKind};

    fn sample() -> Table {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        Table::from_rows(
            vec!["id", "price", "name", "active", "day", "at"],
            vec![
                vec![
                    CellValue::Int(1),
                    CellValue::Float(9.5),
                    CellValue::from("alpha"),
                    CellValue::Bool(true),
                    CellValue::Date(day),
                    CellValue::DateTime(day.and_hms_opt(13, 45, 10).unwrap()),
                ],
                vec![
                    CellValue::Int(2),
                    CellValue::Null,
                    CellValue::from("  padded & <escaped>  "),
                    CellValue::Bool(false),
                    CellValue::Null,
                    CellValue::Null,
                ],
                vec![
                    CellValue::Int(3),
                    CellValue::Float(-0.125),
                    CellValue::from("alpha"),
                    CellValue::Null,
                    CellValue::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
                    CellValue::DateTime(day.and_hms_opt(0, 0, 1).unwrap()),
                ],
            ],
        )
    }

    #[test]
    fn test_round_trip() {
        let table = sample();
        let bytes = ExcelCodec.encode(&table).unwrap();
        let decoded = ExcelCodec.decode(&bytes).unwrap();

        assert!(decoded.values_eq(&table), "{:?}", decoded);
        assert_eq!(decoded.columns[0].kind(), ColumnKind::Numeric);
        assert_eq!(decoded.columns[1].kind(), ColumnKind::Numeric);
        assert_eq!(decoded.columns[2].kind(), ColumnKind::Text);
        assert_eq!(decoded.columns[3].cell_type, CellType::Bool);
        assert_eq!(decoded.columns[4].cell_type, CellType::Date);
        assert_eq!(decoded.columns[5].cell_type, CellType::DateTime);
    }

    #[test]
    fn test_blank_string_round_trips() {
        let table = Table::from_rows(vec!["s"], vec![vec!["  ".into()], vec!["x".into()]]);
        let decoded = ExcelCodec.decode(&ExcelCodec.encode(&table).unwrap()).unwrap();

        assert_eq!(decoded.rows[0].cells[0], CellValue::String("  ".into()));
        assert_eq!(decoded.rows[1].cells[0], CellValue::String("x".into()));
    }

    #[test]
    fn test_missing_rows_keep_their_place() {
        let table = Table::from_rows(
            vec!["a", "b"],
            vec![
                vec![CellValue::Null, CellValue::Null],
                vec![CellValue::Int(1), CellValue::from("x")],
                vec![CellValue::Null, CellValue::Null],
                vec![CellValue::Null, CellValue::Null],
            ],
        );
        let decoded = ExcelCodec.decode(&ExcelCodec.encode(&table).unwrap()).unwrap();

        assert_eq!(decoded.row_count(), 4);
        assert!(decoded.values_eq(&table), "{:?}", decoded);
    }

    #[test]
    fn test_corrupt_workbook_is_a_decode_error() {
        let err = ExcelCodec.decode(b"definitely not a workbook").unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn test_header_only_sheet() {
        let table = Table::from_rows(vec!["a", "b"], Vec::new());
        let decoded = ExcelCodec.decode(&ExcelCodec.encode(&table).unwrap()).unwrap();
        assert_eq!(decoded.column_names(), vec!["a", "b"]);
        assert_eq!(decoded.row_count(), 0);
    }

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Float(4.0)), CellValue::Int(4));
        assert_eq!(convert_cell(&Data::Float(4.5)), CellValue::Float(4.5));
        assert_eq!(convert_cell(&Data::String(String::new())), CellValue::Null);
        assert_eq!(
            convert_cell(&Data::String("   ".into())),
            CellValue::String("   ".into())
        );
        assert_eq!(convert_cell(&Data::Empty), CellValue::Null);
    }
}
