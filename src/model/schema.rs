//! Column metadata and type information

use serde::{Deserialize, Serialize};

/// Type observed for a cell or widened over a whole column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Null,
    Bool,
    Int,
    Float,
    String,
    Date,
    DateTime,
    Mixed,
}

impl CellType {
    /// Widen the type to accommodate another type
    pub fn widen(self, other: CellType) -> CellType {
        if self == other {
            return self;
        }

        match (self, other) {
            (CellType::Null, t) | (t, CellType::Null) => t,
            (CellType::Int, CellType::Float) | (CellType::Float, CellType::Int) => CellType::Float,
            (CellType::Date, CellType::DateTime) | (CellType::DateTime, CellType::Date) => {
                CellType::DateTime
            }
            _ => CellType::Mixed,
        }
    }

    /// Coarse kind that cleaning operations dispatch on.
    ///
    /// A column with no present values counts as numeric, matching how
    /// spreadsheet tools type an all-blank column.
    pub fn kind(self) -> ColumnKind {
        match self {
            CellType::Null | CellType::Int | CellType::Float => ColumnKind::Numeric,
            CellType::String => ColumnKind::Text,
            CellType::Bool | CellType::Date | CellType::DateTime | CellType::Mixed => {
                ColumnKind::Other
            }
        }
    }
}

impl std::fmt::Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellType::Null => write!(f, "null"),
            CellType::Bool => write!(f, "bool"),
            CellType::Int => write!(f, "int"),
            CellType::Float => write!(f, "float"),
            CellType::String => write!(f, "string"),
            CellType::Date => write!(f, "date"),
            CellType::DateTime => write!(f, "datetime"),
            CellType::Mixed => write!(f, "mixed"),
        }
    }
}

/// How a column's values are interpreted by cleaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Other,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Other => write!(f, "other"),
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (from header)
    pub name: String,
    /// Type widened over every value at decode time
    pub cell_type: CellType,
}

impl Column {
    /// Create a column whose type has not been inferred yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell_type: CellType::Null,
        }
    }

    /// Create a column with a known type
    pub fn with_type(name: impl Into<String>, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            cell_type,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.cell_type.kind()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind() == ColumnKind::Numeric
    }
}

/// Make header names unique.
///
/// Empty names become `Unnamed: {position}`; a repeated name gets a `.1`, `.2`, ...
/// suffix, skipping suffixes that would collide with a name already taken.
pub fn unique_names<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let raw: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let name = name.as_ref();
            if name.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut taken: rustc_hash::FxHashSet<String> = rustc_hash::FxHashSet::default();
    let mut names = Vec::with_capacity(raw.len());

    for name in raw {
        if taken.insert(name.clone()) {
            names.push(name);
            continue;
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{}.{}", name, suffix);
            if taken.insert(candidate.clone()) {
                names.push(candidate);
                break;
            }
            suffix += 1;
        }
    }

    names
}
