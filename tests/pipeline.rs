use chrono::NaiveDate;

use datasweep::model::{CellValue, ColumnKind, Table};
use datasweep::{
    convert, convert_batch, decode, detect_format, encode, fill_missing_numeric, project,
    remove_duplicates, CleaningOp, ColumnSelection, ConversionJob, ConvertOptions, Error,
    FormatTag, SourceFile,
};

const SCENARIO: &str = "id,val,tag\n1,,a\n1,5,a\n2,3,b\n";

fn scenario_table() -> Table {
    decode(SCENARIO.as_bytes(), FormatTag::Csv).unwrap()
}

fn mixed_table() -> Table {
    Table::from_rows(
        vec!["id", "score", "name", "joined"],
        vec![
            vec![
                CellValue::Int(1),
                CellValue::Float(2.5),
                "Ada".into(),
                CellValue::Date(NaiveDate::from_ymd_opt(2021, 5, 4).unwrap()),
            ],
            vec![CellValue::Int(2), CellValue::Null, "Grace".into(), CellValue::Null],
            vec![
                CellValue::Int(3),
                CellValue::Float(7.75),
                CellValue::Null,
                CellValue::Date(NaiveDate::from_ymd_opt(2022, 1, 31).unwrap()),
            ],
        ],
    )
}

#[test]
fn dedup_then_fill_scenario() {
    let table = fill_missing_numeric(remove_duplicates(scenario_table()));

    let expected: Vec<Vec<CellValue>> = vec![
        vec![CellValue::Int(1), CellValue::Float(4.0), "a".into()],
        vec![CellValue::Int(1), CellValue::Int(5), "a".into()],
        vec![CellValue::Int(2), CellValue::Int(3), "b".into()],
    ];
    let cells: Vec<Vec<CellValue>> = table.rows.into_iter().map(|r| r.cells).collect();
    assert_eq!(cells, expected);
}

#[test]
fn all_missing_numeric_column_is_left_alone() {
    let table = decode(b"id,empty,tag\n1,,x\n2,,\n3,,y\n", FormatTag::Csv).unwrap();
    assert_eq!(table.columns[1].kind(), ColumnKind::Numeric);

    let filled = fill_missing_numeric(table.clone());
    assert!(filled.column_values(1).all(CellValue::is_null));
    assert_eq!(filled.column_values(0).collect::<Vec<_>>(), table.column_values(0).collect::<Vec<_>>());
    assert_eq!(filled.column_values(2).collect::<Vec<_>>(), table.column_values(2).collect::<Vec<_>>());
}

#[test]
fn cleaning_is_idempotent() {
    let table = decode(b"a,b\n1,\n1,\n2,4\n2,4\n,6\n", FormatTag::Csv).unwrap();

    let once = remove_duplicates(table.clone());
    assert_eq!(remove_duplicates(once.clone()), once);

    let once = fill_missing_numeric(table);
    assert_eq!(fill_missing_numeric(once.clone()), once);
}

#[test]
fn projection_keeps_rows_and_rejects_unknown_names() {
    let table = scenario_table();

    let projected = project(table.clone(), &["tag", "id"]).unwrap();
    assert_eq!(projected.row_count(), table.row_count());
    for (out, original) in projected.rows.iter().zip(&table.rows) {
        assert_eq!(out.cells, vec![original.cells[2].clone(), original.cells[0].clone()]);
    }

    match project(table, &["id", "ghost"]) {
        Err(Error::UnknownColumn { name }) => assert_eq!(name, "ghost"),
        other => panic!("expected unknown column error, got {:?}", other),
    }
}

#[test]
fn csv_round_trip() {
    let table = mixed_table();
    let bytes = encode(&table, FormatTag::Csv).unwrap();
    let decoded = decode(&bytes, FormatTag::Csv).unwrap();
    assert_eq!(decoded, table);
}

#[test]
fn excel_round_trip() {
    let table = mixed_table();
    let bytes = encode(&table, FormatTag::Excel).unwrap();
    let decoded = decode(&bytes, FormatTag::Excel).unwrap();
    assert!(decoded.values_eq(&table), "{:?}", decoded);
}

#[test]
fn csv_to_excel_and_back_keeps_values() {
    let source = SourceFile::new("people.csv", encode(&mixed_table(), FormatTag::Csv).unwrap());
    let to_excel = convert(&source, &ConvertOptions::new(FormatTag::Excel)).unwrap();
    assert_eq!(to_excel.filename, "people.xlsx");

    let workbook = SourceFile::new(to_excel.filename.clone(), to_excel.bytes);
    let to_csv = convert(&workbook, &ConvertOptions::new(FormatTag::Csv)).unwrap();
    assert_eq!(to_csv.filename, "people.csv");

    let decoded = decode(&to_csv.bytes, FormatTag::Csv).unwrap();
    assert!(decoded.values_eq(&mixed_table()));
}

#[test]
fn unsupported_file_does_not_stop_siblings() {
    assert_eq!(detect_format("data.txt"), FormatTag::Unsupported);

    let options = ConvertOptions::from_flags(true, true, ColumnSelection::All, FormatTag::Excel);
    let jobs = vec![
        ConversionJob::new(SourceFile::new("data.txt", SCENARIO.as_bytes().to_vec()), options.clone()),
        ConversionJob::new(SourceFile::new("data.csv", SCENARIO.as_bytes().to_vec()), options),
    ];

    let report = convert_batch(&jobs);

    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "data.txt");
    assert!(matches!(failed[0].1, Error::UnsupportedFormat { .. }));

    let succeeded: Vec<_> = report.succeeded().collect();
    assert_eq!(succeeded.len(), 1);
    assert_eq!(succeeded[0].0, "data.csv");
    assert_eq!(succeeded[0].1.filename, "data.xlsx");
    assert_eq!(succeeded[0].1.cleaning.cells_filled, 1);
}

#[test]
fn per_file_options_are_independent() {
    let jobs = vec![
        ConversionJob::new(
            SourceFile::new("a.csv", SCENARIO.as_bytes().to_vec()),
            ConvertOptions::new(FormatTag::Csv)
                .with_columns(ColumnSelection::named(["id", "ghost"])),
        ),
        ConversionJob::new(
            SourceFile::new("b.csv", SCENARIO.as_bytes().to_vec()),
            ConvertOptions::new(FormatTag::Csv)
                .with_cleaning(vec![CleaningOp::FillMissingNumeric])
                .with_columns(ColumnSelection::named(["val"])),
        ),
    ];

    let report = convert_batch(&jobs);
    assert!(matches!(
        report.outcomes[0].result,
        Err(Error::UnknownColumn { ref name }) if name == "ghost"
    ));

    let b = report.outcomes[1].result.as_ref().unwrap();
    assert_eq!(String::from_utf8(b.bytes.clone()).unwrap(), "val\n4.0\n5\n3\n");
}
