//! datasweep - Clean, trim and convert tabular files

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rustc_hash::FxHashSet;
use termcolor::{ColorChoice, StandardStream};
use tracing::error;

use datasweep::clean::CleaningOp;
use datasweep::codec::FormatTag;
use datasweep::config::{ColumnSelection, ConvertOptions, ReportFormat};
use datasweep::logging::init_logging;
use datasweep::output::{render_preview, OutputFactory};
use datasweep::pipeline::{
    convert_batch, preview, BatchReport, ConversionJob, PipelineResult, SourceFile,
};
use datasweep::Error;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTargetFormat {
    Csv,
    Excel,
}

impl From<CliTargetFormat> for FormatTag {
    fn from(f: CliTargetFormat) -> Self {
        match f {
            CliTargetFormat::Csv => FormatTag::Csv,
            CliTargetFormat::Excel => FormatTag::Excel,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCleaningOp {
    RemoveDuplicates,
    FillMissing,
}

impl From<CliCleaningOp> for CleaningOp {
    fn from(op: CliCleaningOp) -> Self {
        match op {
            CliCleaningOp::RemoveDuplicates => CleaningOp::RemoveDuplicates,
            CliCleaningOp::FillMissing => CleaningOp::FillMissingNumeric,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliReportFormat {
    Terminal,
    Json,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(f: CliReportFormat) -> Self {
        match f {
            CliReportFormat::Terminal => ReportFormat::Terminal,
            CliReportFormat::Json => ReportFormat::Json,
        }
    }
}

/// Clean, trim and convert tabular files between CSV and Excel
#[derive(Parser, Debug)]
#[command(name = "datasweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert files, optionally cleaning them and keeping only some columns
    Convert(ConvertArgs),
    /// Show size, column kinds and the first rows of each file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Files to convert (.csv, .xlsx)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Format to convert to
    #[arg(short, long, value_enum)]
    to: CliTargetFormat,

    /// Cleaning step to apply; repeat to apply several, in the order given
    #[arg(long = "clean", value_enum)]
    clean: Vec<CliCleaningOp>,

    /// Column(s) to keep, in output order (comma-separated); default is all
    #[arg(short, long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Directory the converted files are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value = "terminal")]
    report: CliReportFormat,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Files to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Number of rows to preview
    #[arg(short = 'n', long, default_value_t = 5)]
    rows: usize,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Convert(args) => run_convert(args),
        Command::Inspect(args) => run_inspect(args),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1), // At least one file failed
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Read a file into a SourceFile named after its file name
fn read_source(path: &Path) -> Result<SourceFile> {
    let content =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(name, content))
}

/// Read every path, logging and counting the ones that cannot be read
fn read_sources(paths: &[PathBuf]) -> (Vec<SourceFile>, usize) {
    let mut sources = Vec::with_capacity(paths.len());
    let mut unreadable = 0;

    for path in paths {
        match read_source(path) {
            Ok(source) => sources.push(source),
            Err(e) => {
                error!("{:#}", e);
                unreadable += 1;
            }
        }
    }

    (sources, unreadable)
}

fn terminal_colors() -> ColorChoice {
    if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn run_convert(args: ConvertArgs) -> Result<bool> {
    let options = ConvertOptions::new(args.to.into())
        .with_cleaning(args.clean.into_iter().map(CleaningOp::from).collect())
        .with_columns(match args.columns {
            Some(names) => ColumnSelection::Named(names),
            None => ColumnSelection::All,
        });

    let (sources, unreadable) = read_sources(&args.files);
    let jobs: Vec<ConversionJob> = sources
        .into_iter()
        .map(|source| ConversionJob::new(source, options.clone()))
        .collect();

    let mut report = convert_batch(&jobs);

    fs::create_dir_all(&args.out_dir).with_context(|| {
        format!("Failed to create output directory: {}", args.out_dir.display())
    })?;

    let inputs: FxHashSet<PathBuf> = args.files.iter().map(|p| canonical(p)).collect();
    write_outputs(&mut report, &args.out_dir, &inputs);

    let format: ReportFormat = args.report.into();
    let color = match format {
        ReportFormat::Terminal => terminal_colors(),
        ReportFormat::Json => ColorChoice::Never,
    };
    let mut stdout = StandardStream::stdout(color);
    OutputFactory::create(format).render(&report, &mut stdout)?;

    Ok(unreadable == 0 && report.all_succeeded())
}

/// Write every converted file into `out_dir`. A write that fails, would
/// replace an input, or repeats an earlier output name becomes that file's
/// error; the other files are still written.
fn write_outputs(report: &mut BatchReport, out_dir: &Path, inputs: &FxHashSet<PathBuf>) {
    let mut claimed: FxHashSet<String> = FxHashSet::default();

    for outcome in &mut report.outcomes {
        let failure = match &outcome.result {
            Ok(result) => write_output(out_dir, result, inputs, &mut claimed).err(),
            Err(_) => None,
        };
        if let Some(e) = failure {
            error!(file = %outcome.filename, "{}", e);
            outcome.result = Err(e);
        }
    }
}

fn write_output(
    out_dir: &Path,
    result: &PipelineResult,
    inputs: &FxHashSet<PathBuf>,
    claimed: &mut FxHashSet<String>,
) -> Result<(), Error> {
    let target = out_dir.join(&result.filename);
    let output_error = |message: String| Error::Output {
        path: target.display().to_string(),
        message,
    };

    if !claimed.insert(result.filename.clone()) {
        return Err(output_error(
            "another file in this batch has the same output name".to_string(),
        ));
    }
    if inputs.contains(&canonical(&target)) {
        return Err(output_error("would overwrite an input file".to_string()));
    }

    fs::write(&target, &result.bytes).map_err(|e| output_error(e.to_string()))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn run_inspect(args: InspectArgs) -> Result<bool> {
    let (sources, unreadable) = read_sources(&args.files);
    let mut stdout = StandardStream::stdout(terminal_colors());
    let mut all_ok = unreadable == 0;

    for source in &sources {
        match preview(source, args.rows) {
            Ok(head) => render_preview(source, &head, &mut stdout)?,
            Err(e) => {
                error!(file = %source.filename(), "{}", e);
                all_ok = false;
            }
        }
    }

    Ok(all_ok)
}
