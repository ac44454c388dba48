//! Missing value imputation

use crate::model::{CellValue, Table};

/// Replace missing values in numeric columns with the column mean.
///
/// The mean is taken over the values present before any replacement. Columns
/// of other kinds, and numeric columns with no present value, are left alone.
pub fn fill_missing_numeric(table: Table) -> Table {
    fill_missing_numeric_counted(table).0
}

/// `fill_missing_numeric`, also returning how many cells were filled
pub fn fill_missing_numeric_counted(mut table: Table) -> (Table, usize) {
    let mut filled = 0;

    for col_idx in 0..table.column_count() {
        if !table.columns[col_idx].is_numeric() {
            continue;
        }

        let Some(mean) = column_mean(&table, col_idx) else {
            continue;
        };

        for row in &mut table.rows {
            if row.cells[col_idx].is_null() {
                row.cells[col_idx] = CellValue::Float(mean);
                filled += 1;
            }
        }
    }

    (table, filled)
}

/// Arithmetic mean of the present numeric values, `None` when there are none
fn column_mean(table: &Table, col_idx: usize) -> Option<f64> {
    let (sum, count) = table
        .column_values(col_idx)
        .filter_map(CellValue::as_f64)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
