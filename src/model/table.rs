//! In-memory table: typed cells, rows and the column header

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::schema::{CellType, Column};

/// A cell value with type information. `Null` is a missing value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // NaN equals NaN
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            // 4 and 4.0 are the same value
            (CellValue::Int(a), CellValue::Float(b)) => (*a as f64) == *b,
            (CellValue::Float(a), CellValue::Int(b)) => *a == (*b as f64),
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Int and Float share a tag and hash through f64 so that values which
        // compare equal across the two variants also hash equal.
        match self {
            CellValue::Null => 0u8.hash(state),
            CellValue::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            CellValue::Int(i) => {
                2u8.hash(state);
                numeric_bits(*i as f64).hash(state);
            }
            CellValue::Float(f) => {
                2u8.hash(state);
                numeric_bits(*f).hash(state);
            }
            CellValue::String(s) => {
                3u8.hash(state);
                s.hash(state);
            }
            CellValue::Date(d) => {
                4u8.hash(state);
                d.hash(state);
            }
            CellValue::DateTime(dt) => {
                5u8.hash(state);
                dt.hash(state);
            }
        }
    }
}

/// Bit pattern with `-0.0` folded onto `0.0` and every NaN onto one NaN.
fn numeric_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0f64.to_bits()
    } else {
        f.to_bits()
    }
}

impl CellValue {
    /// Check if the value is missing
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Type of this single value
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Null => CellType::Null,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Int(_) => CellType::Int,
            CellValue::Float(_) => CellType::Float,
            CellValue::String(_) => CellType::String,
            CellValue::Date(_) => CellType::Date,
            CellValue::DateTime(_) => CellType::DateTime,
        }
    }

    /// Convert to a display string. Missing values display as an empty string.
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed(""),
            CellValue::Bool(b) => Cow::Borrowed(if *b { "True" } else { "False" }),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(format_float(*f)),
            CellValue::String(s) => Cow::Borrowed(s.as_str()),
            CellValue::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        }
    }
}

/// Render a float so it reads back as a float: integral values keep a
/// trailing `.0`, everything else uses the shortest round-trip form.
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// One record of a table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row {
    /// Values, one per column
    pub cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Value at a column position
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }
}

/// A table containing columns and rows.
///
/// Every row holds exactly one cell per column; `add_row` pads or cuts the
/// cells to enforce it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Header, in output order
    pub columns: Vec<Column>,
    /// All rows in the table, in source order
    pub rows: Vec<Row>,
}

impl Table {
    /// Empty table with the given header
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from header names and row values, inferring column types
    pub fn from_rows<S: Into<String>>(names: Vec<S>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = names.into_iter().map(Column::new).collect();
        let mut table = Table::new(columns);
        for cells in rows {
            table.add_row(cells);
        }
        table.infer_column_types();
        table
    }

    /// Append a row, padding or truncating it to the header width
    pub fn add_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.column_count(), CellValue::Null);
        self.rows.push(Row::new(cells));
    }

    /// Set every column's type to the widening of its values' types
    pub fn infer_column_types(&mut self) {
        for col_idx in 0..self.column_count() {
            let inferred = self
                .rows
                .iter()
                .filter_map(|row| row.get(col_idx))
                .fold(CellType::Null, |acc, cell| acc.widen(cell.cell_type()));

            if let Some(col) = self.columns.get_mut(col_idx) {
                col.cell_type = inferred;
            }
        }
    }

    /// Position of the named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Copy of the first `n` rows
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Same column names and the same values row for row.
    ///
    /// Unlike `==` this ignores column types, which a target format may not
    /// preserve.
    pub fn values_eq(&self, other: &Table) -> bool {
        self.column_names() == other.column_names() && self.rows == other.rows
    }
}
