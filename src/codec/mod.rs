//! Codec layer: detecting, reading and writing tabular formats

mod csv;
mod excel;
mod xlsx;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Table;

pub use self::csv::CsvCodec;
pub use self::excel::ExcelCodec;

/// Format of a file, as detected from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Csv,
    Excel,
    Unsupported,
}

impl FormatTag {
    /// Extension (with leading dot) written for this format
    pub fn extension(self) -> &'static str {
        match self {
            FormatTag::Csv => ".csv",
            FormatTag::Excel => ".xlsx",
            FormatTag::Unsupported => "",
        }
    }

    /// MIME type of encoded output
    pub fn mime_type(self) -> &'static str {
        match self {
            FormatTag::Csv => "text/csv",
            FormatTag::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            FormatTag::Unsupported => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatTag::Csv => write!(f, "csv"),
            FormatTag::Excel => write!(f, "excel"),
            FormatTag::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl std::str::FromStr for FormatTag {
    type Err = String;

    /// Parse a target format name. Only formats that can be written parse.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(FormatTag::Csv),
            "excel" | "xlsx" => Ok(FormatTag::Excel),
            _ => Err(format!("Unknown target format: {}", s)),
        }
    }
}

/// Trait for reading and writing one tabular format
pub trait Codec: Send + Sync {
    /// The format this codec handles
    fn format(&self) -> FormatTag;

    /// Check if this codec can read files with the given (lowercase) extension
    fn supports_extension(&self, ext: &str) -> bool;

    /// Decode raw file content into a Table
    fn decode(&self, bytes: &[u8]) -> Result<Table>;

    /// Encode a Table into file content
    fn encode(&self, table: &Table) -> Result<Vec<u8>>;
}

/// Registry of the available codecs
pub struct CodecFactory {
    codecs: Vec<Box<dyn Codec>>,
}

impl Default for CodecFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecFactory {
    /// Create a factory with all supported codecs
    pub fn new() -> Self {
        Self {
            codecs: vec![Box::new(CsvCodec), Box::new(ExcelCodec)],
        }
    }

    /// Detect a file's format from its name
    pub fn detect_format(&self, filename: &str) -> FormatTag {
        let ext = file_extension(filename);

        self.codecs
            .iter()
            .find(|codec| codec.supports_extension(&ext))
            .map(|codec| codec.format())
            .unwrap_or(FormatTag::Unsupported)
    }

    /// Get the codec for a format
    pub fn get_codec(&self, format: FormatTag) -> Result<&dyn Codec> {
        self.codecs
            .iter()
            .find(|codec| codec.format() == format)
            .map(|codec| codec.as_ref())
            .ok_or_else(|| Error::UnsupportedFormat {
                extension: format.to_string(),
            })
    }

    pub fn decode(&self, bytes: &[u8], format: FormatTag) -> Result<Table> {
        self.get_codec(format)?.decode(bytes)
    }

    pub fn encode(&self, table: &Table, format: FormatTag) -> Result<Vec<u8>> {
        self.get_codec(format)?.encode(table)
    }
}

/// Lowercase extension of a file name, without the dot; empty when absent
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Detect a file's format from its name
pub fn detect_format(filename: &str) -> FormatTag {
    CodecFactory::new().detect_format(filename)
}

/// Decode bytes of the given format into a Table
pub fn decode(bytes: &[u8], format: FormatTag) -> Result<Table> {
    CodecFactory::new().decode(bytes, format)
}

/// Encode a Table into bytes of the given format
pub fn encode(table: &Table, format: FormatTag) -> Result<Vec<u8>> {
    CodecFactory::new().encode(table, format)
}

pub fn extension_for(format: FormatTag) -> &'static str {
    format.extension()
}

pub fn mime_type_for(format: FormatTag) -> &'static str {
    format.mime_type()
}
