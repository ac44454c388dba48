//! Error types for the conversion pipeline

use thiserror::Error;

use crate::codec::FormatTag;

/// Failure converting a single file. Every variant is local to one file and
/// never aborts its siblings in a batch.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unsupported file type: {}", display_extension(.extension))]
    UnsupportedFormat { extension: String },

    #[error("failed to decode {format}: {message}")]
    Decode { format: FormatTag, message: String },

    #[error("column not found: {name}")]
    UnknownColumn { name: String },

    #[error("column selected more than once: {name}")]
    DuplicateColumn { name: String },

    #[error("failed to encode {format}: {message}")]
    Encode { format: FormatTag, message: String },

    /// Raised by hosts that write results to disk
    #[error("cannot write {path}: {message}")]
    Output { path: String, message: String },
}

fn display_extension(ext: &str) -> String {
    if ext.is_empty() {
        "(no extension)".to_string()
    } else {
        format!(".{}", ext)
    }
}

impl Error {
    pub fn decode(format: FormatTag, message: impl Into<String>) -> Self {
        Error::Decode {
            format,
            message: message.into(),
        }
    }

    pub fn encode(format: FormatTag, message: impl Into<String>) -> Self {
        Error::Encode {
            format,
            message: message.into(),
        }
    }

    /// Stable short name of the error kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedFormat { .. } => "unsupported_format",
            Error::Decode { .. } => "decode",
            Error::UnknownColumn { .. } => "unknown_column",
            Error::DuplicateColumn { .. } => "duplicate_column",
            Error::Encode { .. } => "encode",
            Error::Output { .. } => "output",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
