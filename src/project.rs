//! Column projection

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::model::{Row, Table};

/// Keep exactly the named columns, in the order given.
///
/// Rows keep their count and order. An empty selection yields a table with
/// no columns and the original number of rows.
pub fn project<S: AsRef<str>>(table: Table, names: &[S]) -> Result<Table> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut indices = Vec::with_capacity(names.len());

    for name in names {
        let name = name.as_ref();
        let idx = table.column_index(name).ok_or_else(|| Error::UnknownColumn {
            name: name.to_string(),
        })?;
        if !seen.insert(name) {
            return Err(Error::DuplicateColumn {
                name: name.to_string(),
            });
        }
        indices.push(idx);
    }

    let columns = indices.iter().map(|&i| table.columns[i].clone()).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(indices.iter().map(|&i| row.cells[i].clone()).collect()))
        .collect();

    Ok(Table { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn sample() -> Table {
        Table::from_rows(
            vec!["id", "val", "tag"],
            vec![
                vec![CellValue::Int(1), CellValue::Null, "a".into()],
                vec![CellValue::Int(1), CellValue::Int(5), "a".into()],
                vec![CellValue::Int(2), CellValue::Int(3), "b".into()],
            ],
        )
    }

    #[test]
    fn test_reorders_and_keeps_rows() {
        let projected = project(sample(), &["tag", "id"]).unwrap();

        assert_eq!(projected.column_names(), vec!["tag", "id"]);
        assert_eq!(projected.row_count(), 3);
        assert_eq!(
            projected.rows[2].cells,
            vec![CellValue::from("b"), CellValue::Int(2)]
        );
        assert_eq!(projected.columns[1], sample().columns[0]);
    }

    #[test]
    fn test_unknown_column() {
        let err = project(sample(), &["id", "ghost"]).unwrap_err();
        match err {
            Error::UnknownColumn { name } => assert_eq!(name, "ghost"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_selection() {
        let err = project(sample(), &["id", "id"]).unwrap_err();
        assert_eq!(err.kind(), "duplicate_column");
    }

    #[test]
    fn test_empty_selection_keeps_row_count() {
        let projected = project::<&str>(sample(), &[]).unwrap();
        assert_eq!(projected.column_count(), 0);
        assert_eq!(projected.row_count(), 3);
        assert!(projected.rows.iter().all(|r| r.cells.is_empty()));
    }

    #[test]
    fn test_full_selection_is_identity() {
        let projected = project(sample(), &["id", "val", "tag"]).unwrap();
        assert_eq!(projected, sample());
    }
}
