//! Colored terminal output

use std::io::Write;

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::error::Error;
use crate::model::Table;
use crate::pipeline::{BatchReport, PipelineResult, SourceFile};

use super::OutputFormatter;

/// Terminal report with colored status markers
pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }

    fn write_success(
        &self,
        source: &str,
        result: &PipelineResult,
        writer: &mut dyn WriteColor,
    ) -> Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
        write!(writer, "  ok    ")?;
        writer.reset()?;
        write!(
            writer,
            "{} → {} ({} rows, {} columns, {})",
            source,
            result.filename,
            result.rows,
            result.columns,
            format_bytes(result.bytes.len())
        )?;

        let cleaning = &result.cleaning;
        if cleaning.rows_removed > 0 || cleaning.cells_filled > 0 {
            write!(
                writer,
                "; removed {} duplicate rows, filled {} cells",
                cleaning.rows_removed, cleaning.cells_filled
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_failure(&self, source: &str, error: &Error, writer: &mut dyn WriteColor) -> Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        write!(writer, "  error ")?;
        writer.reset()?;
        writeln!(writer, "{}: {}", source, error)?;
        Ok(())
    }

    fn write_summary(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        writeln!(writer)?;
        writeln!(
            writer,
            "Summary: {} converted, {} failed",
            report.success_count(),
            report.failure_count()
        )?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, report: &BatchReport, writer: &mut dyn WriteColor) -> Result<()> {
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(result) => self.write_success(&outcome.filename, result, writer)?,
                Err(e) => self.write_failure(&outcome.filename, e, writer)?,
            }
        }
        self.write_summary(report, writer)
    }
}

/// Print a file's name, size, column kinds and the given leading rows
pub fn render_preview(source: &SourceFile, head: &Table, writer: &mut dyn WriteColor) -> Result<()> {
    writer.set_color(ColorSpec::new().set_bold(true))?;
    write!(writer, "{}", source.filename())?;
    writer.reset()?;
    writeln!(writer, " ({:.2} KB, {})", source.size_kb(), source.format())?;

    let kinds: Vec<String> = head
        .columns
        .iter()
        .map(|c| format!("{} ({})", c.name, c.kind()))
        .collect();
    writeln!(writer, "Columns: {}", kinds.join(", "))?;

    if head.column_count() > 0 {
        writeln!(writer, "{}", build_table(head))?;
    }
    Ok(())
}

/// Build a boxed text table from a Table's header and rows
fn build_table(table: &Table) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().map(|c| c.name.clone()));
    for row in &table.rows {
        builder.push_record(row.cells.iter().map(|c| c.display().into_owned()));
    }

    let mut rendered = builder.build();
    rendered.with(Style::modern());
    rendered.to_string()
}

fn format_bytes(n: usize) -> String {
    if n < 1024 {
        format!("{} B", n)
    } else {
        format!("{:.2} KB", n as f64 / 1024.0)
    }
}
