//! Data model for tabular data representation

mod schema;
mod table;

pub use schema::{unique_names, CellType, Column, ColumnKind};
pub use table::{format_float, CellValue, Row, Table};
