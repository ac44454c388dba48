//! datasweep - Clean, trim and convert tabular files
//!
//! Reads CSV files and spreadsheet workbooks into a typed in-memory table,
//! optionally removes duplicate rows and fills missing numbers with the
//! column mean, keeps a chosen set of columns and writes the result as CSV
//! or xlsx.

pub mod clean;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod project;

pub use clean::{fill_missing_numeric, remove_duplicates, CleaningOp};
pub use codec::{decode, detect_format, encode, extension_for, mime_type_for, FormatTag};
pub use config::{ColumnSelection, ConvertOptions};
pub use error::{Error, Result};
pub use model::Table;
pub use pipeline::{convert, convert_batch, BatchReport, ConversionJob, PipelineResult, SourceFile};
pub use project::project;
