//! Rendering of batch reports and file previews

mod json;
mod terminal;

use anyhow::Result;
use termcolor::WriteColor;

use crate::config::ReportFormat;
use crate::pipeline::BatchReport;

pub use json::JsonOutput;
pub use terminal::{render_preview, TerminalOutput};

/// Trait for report formatters
pub trait OutputFormatter {
    /// Render a batch report to a writer
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Factory for creating report formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create a formatter for the requested report format
    pub fn create(format: ReportFormat) -> Box<dyn OutputFormatter> {
        match format {
            ReportFormat::Terminal => Box::new(TerminalOutput::new()),
            ReportFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}
