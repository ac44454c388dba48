//! Per-file conversion options

use serde::{Deserialize, Serialize};

use crate::clean::CleaningOp;
use crate::codec::FormatTag;

/// Output format for batch reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

/// Which columns survive into the output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnSelection {
    /// Every column, in source order
    #[default]
    All,
    /// Exactly these columns, in this order
    Named(Vec<String>),
}

impl ColumnSelection {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnSelection::Named(names.into_iter().map(Into::into).collect())
    }
}

/// Configuration for converting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Cleaning transforms, applied in this order before projection
    pub cleaning: Vec<CleaningOp>,
    /// Columns to keep
    pub columns: ColumnSelection,
    /// Format to encode the result in
    pub target_format: FormatTag,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            cleaning: Vec::new(),
            columns: ColumnSelection::All,
            target_format: FormatTag::Csv,
        }
    }
}

impl ConvertOptions {
    /// Create options that convert to the given format without cleaning
    pub fn new(target_format: FormatTag) -> Self {
        Self {
            target_format,
            ..Default::default()
        }
    }

    /// Build options from the two cleaning switches; duplicates are removed
    /// before missing values are filled
    pub fn from_flags(
        remove_duplicates: bool,
        fill_missing_numeric: bool,
        columns: ColumnSelection,
        target_format: FormatTag,
    ) -> Self {
        Self::new(target_format)
            .with_remove_duplicates(remove_duplicates)
            .with_fill_missing_numeric(fill_missing_numeric)
            .with_columns(columns)
    }

    /// Append duplicate removal to the cleaning steps
    pub fn with_remove_duplicates(self, enabled: bool) -> Self {
        self.with_step(CleaningOp::RemoveDuplicates, enabled)
    }

    /// Append mean imputation to the cleaning steps
    pub fn with_fill_missing_numeric(self, enabled: bool) -> Self {
        self.with_step(CleaningOp::FillMissingNumeric, enabled)
    }

    /// Replace the cleaning steps with an explicit order
    pub fn with_cleaning(mut self, ops: Vec<CleaningOp>) -> Self {
        self.cleaning = ops;
        self
    }

    /// Set the column selection
    pub fn with_columns(mut self, columns: ColumnSelection) -> Self {
        self.columns = columns;
        self
    }

    fn with_step(mut self, op: CleaningOp, enabled: bool) -> Self {
        if enabled && !self.cleaning.contains(&op) {
            self.cleaning.push(op);
        }
        self
    }
}
