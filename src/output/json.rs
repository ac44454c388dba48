//! JSON report format

use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use termcolor::WriteColor;

use crate::clean::CleaningSummary;
use crate::pipeline::BatchReport;

use super::OutputFormatter;

/// JSON report formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<JsonFile<'a>>,
    succeeded: usize,
    failed: usize,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum JsonFile<'a> {
    Ok {
        file: &'a str,
        output: &'a str,
        mime_type: &'a str,
        bytes: usize,
        rows: usize,
        columns: usize,
        cleaning: CleaningSummary,
    },
    Error {
        file: &'a str,
        kind: &'static str,
        message: String,
    },
}

impl OutputFormatter for JsonOutput {
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        let files = report
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(result) => JsonFile::Ok {
                    file: &outcome.filename,
                    output: &result.filename,
                    mime_type: result.mime_type,
                    bytes: result.bytes.len(),
                    rows: result.rows,
                    columns: result.columns,
                    cleaning: result.cleaning,
                },
                Err(e) => JsonFile::Error {
                    file: &outcome.filename,
                    kind: e.kind(),
                    message: e.to_string(),
                },
            })
            .collect();

        let output = JsonReport {
            files,
            succeeded: report.success_count(),
            failed: report.failure_count(),
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &output)?;
        } else {
            serde_json::to_writer(&mut *writer, &output)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FormatTag;
    use crate::config::ConvertOptions;
    use crate::pipeline::{convert_batch, ConversionJob, SourceFile};

    #[test]
    fn test_render_mixed_batch() {
        let options = ConvertOptions::new(FormatTag::Csv);
        let report = convert_batch(&[
            ConversionJob::new(SourceFile::new("a.csv", b"x\n1\n".to_vec()), options.clone()),
            ConversionJob::new(SourceFile::new("b.txt", b"x\n1\n".to_vec()), options),
        ]);

        let mut buffer = termcolor::NoColor::new(Vec::new());
        JsonOutput::compact().render(&report, &mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer.into_inner()).unwrap();

        assert_eq!(value["succeeded"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["files"][0]["status"], "ok");
        assert_eq!(value["files"][0]["output"], "a.csv");
        assert_eq!(value["files"][1]["status"], "error");
        assert_eq!(value["files"][1]["kind"], "unsupported_format");
    }
}
