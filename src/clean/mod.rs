//! Cleaning transforms over whole tables

mod dedup;
mod impute;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Table;

pub use dedup::{remove_duplicates, remove_duplicates_counted};
pub use impute::{fill_missing_numeric, fill_missing_numeric_counted};

/// A cleaning transform that can be requested for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleaningOp {
    RemoveDuplicates,
    FillMissingNumeric,
}

impl std::str::FromStr for CleaningOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remove-duplicates" | "dedup" => Ok(CleaningOp::RemoveDuplicates),
            "fill-missing" | "fill-missing-numeric" => Ok(CleaningOp::FillMissingNumeric),
            _ => Err(format!("Unknown cleaning operation: {}", s)),
        }
    }
}

impl std::fmt::Display for CleaningOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleaningOp::RemoveDuplicates => write!(f, "remove-duplicates"),
            CleaningOp::FillMissingNumeric => write!(f, "fill-missing"),
        }
    }
}

/// What the cleaning step did to one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_removed: usize,
    pub cells_filled: usize,
}

impl CleaningOp {
    /// Apply this transform, recording its effect in `summary`
    pub fn apply(self, table: Table, summary: &mut CleaningSummary) -> Table {
        match self {
            CleaningOp::RemoveDuplicates => {
                let (table, removed) = remove_duplicates_counted(table);
                debug!(removed, "removed duplicate rows");
                summary.rows_removed += removed;
                table
            }
            CleaningOp::FillMissingNumeric => {
                let (table, filled) = fill_missing_numeric_counted(table);
                debug!(filled, "filled missing numeric values");
                summary.cells_filled += filled;
                table
            }
        }
    }
}

/// Apply cleaning transforms in the order given
pub fn apply_all(table: Table, ops: &[CleaningOp]) -> (Table, CleaningSummary) {
    let mut summary = CleaningSummary::default();
    let table = ops
        .iter()
        .fold(table, |table, op| op.apply(table, &mut summary));
    (table, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn scenario() -> Table {
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
    fn test_dedup_then_fill() {
        let (table, summary) = apply_all(
            scenario(),
            &[CleaningOp::RemoveDuplicates, CleaningOp::FillMissingNumeric],
        );

        assert_eq!(summary.rows_removed, 0);
        assert_eq!(summary.cells_filled, 1);
        assert_eq!(
            table.rows[0].cells,
            vec![CellValue::Int(1), CellValue::Float(4.0), "a".into()]
        );
        assert_eq!(
            table.rows[1].cells,
            vec![CellValue::Int(1), CellValue::Int(5), "a".into()]
        );
        assert_eq!(
            table.rows[2].cells,
            vec![CellValue::Int(2), CellValue::Int(3), "b".into()]
        );
    }

    #[test]
    fn test_order_matters() {
        // After filling, the first row no longer differs from a row with the mean
        let table = Table::from_rows(
            vec!["id", "val"],
            vec![
                vec![CellValue::Int(1), CellValue::Null],
                vec![CellValue::Int(1), CellValue::Int(4)],
                vec![CellValue::Int(1), CellValue::Int(4)],
            ],
        );

        let (dedup_first, _) = apply_all(
            table.clone(),
            &[CleaningOp::RemoveDuplicates, CleaningOp::FillMissingNumeric],
        );
        let (fill_first, _) = apply_all(
            table,
            &[CleaningOp::FillMissingNumeric, CleaningOp::RemoveDuplicates],
        );

        assert_eq!(dedup_first.row_count(), 2);
        assert_eq!(fill_first.row_count(), 1);
    }

    #[test]
    fn test_no_ops_is_identity() {
        let (table, summary) = apply_all(scenario(), &[]);
        assert_eq!(table, scenario());
        assert_eq!(summary, CleaningSummary::default());
    }

    #[test]
    fn test_parse_op() {
        assert_eq!("dedup".parse::<CleaningOp>(), Ok(CleaningOp::RemoveDuplicates));
        assert_eq!("Fill-Missing".parse::<CleaningOp>(), Ok(CleaningOp::FillMissingNumeric));
        assert!("sort".parse::<CleaningOp>().is_err());
    }
}
