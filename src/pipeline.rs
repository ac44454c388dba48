//! Per-file conversion pipeline and batch driver

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::clean::{self, CleaningSummary};
use crate::codec::{file_extension, CodecFactory, FormatTag};
use crate::config::{ColumnSelection, ConvertOptions};
use crate::error::{Error, Result};
use crate::model::Table;
use crate::project::project;

/// An uploaded file, read fully into memory
#[derive(Debug, Clone)]
pub struct SourceFile {
    filename: String,
    content: Vec<u8>,
    format: FormatTag,
}

impl SourceFile {
    /// Wrap a file's name and content; the format is detected from the name
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        let filename = filename.into();
        let format = CodecFactory::new().detect_format(&filename);
        Self {
            filename,
            content,
            format,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn format(&self) -> FormatTag {
        self.format
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Size in KiB, as shown to users
    pub fn size_kb(&self) -> f64 {
        self.content.len() as f64 / 1024.0
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedFormat {
            extension: file_extension(&self.filename),
        }
    }
}

/// The converted file, ready to be handed out for download
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub rows: usize,
    pub columns: usize,
    pub cleaning: CleaningSummary,
}

/// Name of the converted file: the source name with its extension replaced
pub fn output_filename(source: &str, target: FormatTag) -> String {
    let ext = target.extension().trim_start_matches('.');
    Path::new(source)
        .with_extension(ext)
        .to_string_lossy()
        .into_owned()
}

/// Decode a file and return its first `rows` rows
pub fn preview(source: &SourceFile, rows: usize) -> Result<Table> {
    if source.format == FormatTag::Unsupported {
        return Err(source.unsupported());
    }
    let table = CodecFactory::new().decode(&source.content, source.format)?;
    Ok(table.head(rows))
}

/// Run one file through decode, cleaning, projection and encode
pub fn convert(source: &SourceFile, options: &ConvertOptions) -> Result<PipelineResult> {
    let span = info_span!("convert", file = %source.filename);
    let _enter = span.enter();

    if source.format == FormatTag::Unsupported {
        return Err(source.unsupported());
    }

    let factory = CodecFactory::new();

    let table = factory.decode(&source.content, source.format)?;
    debug!(
        format = %source.format,
        rows = table.row_count(),
        columns = table.column_count(),
        "decoded"
    );

    let (table, cleaning) = clean::apply_all(table, &options.cleaning);

    let table = match &options.columns {
        ColumnSelection::All => table,
        ColumnSelection::Named(names) => project(table, names)?,
    };

    let bytes = factory.encode(&table, options.target_format)?;

    let result = PipelineResult {
        filename: output_filename(&source.filename, options.target_format),
        bytes,
        mime_type: options.target_format.mime_type(),
        rows: table.row_count(),
        columns: table.column_count(),
        cleaning,
    };

    info!(
        output = %result.filename,
        rows = result.rows,
        columns = result.columns,
        bytes = result.bytes.len(),
        "converted"
    );
    Ok(result)
}

/// A file together with the options to convert it with
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub source: SourceFile,
    pub options: ConvertOptions,
}

impl ConversionJob {
    pub fn new(source: SourceFile, options: ConvertOptions) -> Self {
        Self { source, options }
    }
}

/// Outcome of converting one file in a batch
#[derive(Debug)]
pub struct FileOutcome {
    /// Name of the source file
    pub filename: String,
    pub result: Result<PipelineResult>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &PipelineResult)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|r| (o.filename.as_str(), r)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.filename.as_str(), e)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_ok)
    }
}

/// Convert every job independently and in parallel.
///
/// A failing file is recorded in the report and never stops the others.
pub fn convert_batch(jobs: &[ConversionJob]) -> BatchReport {
    let outcomes: Vec<FileOutcome> = jobs
        .par_iter()
        .map(|job| {
            let result = convert(&job.source, &job.options);
            if let Err(ref e) = result {
                warn!(file = %job.source.filename, error = %e, "conversion failed");
            }
            FileOutcome {
                filename: job.source.filename.clone(),
                result,
            }
        })
        .collect();

    BatchReport { outcomes }
}
