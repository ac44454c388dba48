//! Duplicate row removal

use rustc_hash::FxHashSet;

use crate::model::{Row, Table};

/// Drop every row that repeats an earlier row value for value.
///
/// The first occurrence is kept and the kept rows stay in order. Missing
/// values compare equal to each other.
pub fn remove_duplicates(table: Table) -> Table {
    remove_duplicates_counted(table).0
}

/// `remove_duplicates`, also returning how many rows were dropped
pub fn remove_duplicates_counted(table: Table) -> (Table, usize) {
    let Table { columns, rows } = table;
    let before = rows.len();

    let mut seen: FxHashSet<Row> = FxHashSet::default();
    let kept: Vec<Row> = rows
        .into_iter()
        .filter(|row| {
            if seen.contains(row) {
                false
            } else {
                seen.insert(row.clone());
                true
            }
        })
        .collect();

    let removed = before - kept.len();
    (Table { columns, rows: kept }, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn table(rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_rows(vec!["id", "val", "tag"], rows)
    }

    #[test]
    fn test_keeps_first_occurrence_in_order() {
        let t = table(vec![
            vec![2i64.into(), 3i64.into(), "b".into()],
            vec![1i64.into(), CellValue::Null, "a".into()],
            vec![2i64.into(), 3i64.into(), "b".into()],
            vec![1i64.into(), CellValue::Null, "a".into()],
            vec![1i64.into(), 5i64.into(), "a".into()],
        ]);

        let (deduped, removed) = remove_duplicates_counted(t);
        assert_eq!(removed, 2);

        let expected: Vec<Vec<CellValue>> = vec![
            vec![2i64.into(), 3i64.into(), "b".into()],
            vec![1i64.into(), CellValue::Null, "a".into()],
            vec![1i64.into(), 5i64.into(), "a".into()],
        ];
        let cells: Vec<Vec<CellValue>> = deduped.rows.into_iter().map(|r| r.cells).collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_missing_differs_from_present() {
        let t = table(vec![
            vec![1i64.into(), CellValue::Null, "a".into()],
            vec![1i64.into(), 5i64.into(), "a".into()],
        ]);
        assert_eq!(remove_duplicates(t).row_count(), 2);
    }

    #[test]
    fn test_int_and_float_of_same_value_are_duplicates() {
        let t = table(vec![
            vec![1i64.into(), CellValue::Int(4), "a".into()],
            vec![1i64.into(), CellValue::Float(4.0), "a".into()],
        ]);
        assert_eq!(remove_duplicates(t).row_count(), 1);
    }

    #[test]
    fn test_idempotent() {
        let t = table(vec![
            vec![1i64.into(), 2i64.into(), "x".into()],
            vec![1i64.into(), 2i64.into(), "x".into()],
            vec![3i64.into(), CellValue::Null, CellValue::Null],
            vec![3i64.into(), CellValue::Null, CellValue::Null],
        ]);
        let once = remove_duplicates(t);
        let twice = remove_duplicates(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.row_count(), 2);
    }

    #[test]
    fn test_preserves_columns() {
        let t = table(vec![vec![1i64.into(), 2i64.into(), "x".into()]]);
        let columns = t.columns.clone();
        assert_eq!(remove_duplicates(t).columns, columns);
    }
}
