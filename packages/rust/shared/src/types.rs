//! Workbook data model shared by the extraction and analysis pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the column that identifies a row (matched case-insensitively).
pub const ITERATION_COLUMN: &str = "Iteration";

/// Longest sheet name spreadsheet tools accept.
pub const MAX_SHEET_NAME_LEN: usize = 31;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single workbook cell.
///
/// Serialized untagged: `null`, a string, a number, or a boolean.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// The cell's text, if it is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// A named table: a header row plus data rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name as shown in the workbook.
    pub name: String,
    /// Column headers.
    pub columns: Vec<String>,
    /// Data rows. Short rows are treated as padded with empty cells.
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Create an empty sheet with the given headers.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Index of the `Iteration` column, matched case-insensitively.
    pub fn iteration_column(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(ITERATION_COLUMN))
    }

    /// Cell at `(row, col)`; missing cells read as [`Cell::Empty`].
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

/// Provenance recorded on workbooks written by answerlab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookMeta {
    /// Run that last wrote this workbook.
    pub run_id: RunId,
    /// When the workbook was written.
    pub generated_at: DateTime<Utc>,
    /// Tool version that wrote it.
    pub tool_version: String,
}

impl WorkbookMeta {
    /// Stamp a workbook as written now by `tool_version`.
    pub fn now(run_id: RunId, tool_version: impl Into<String>) -> Self {
        Self {
            run_id,
            generated_at: Utc::now(),
            tool_version: tool_version.into(),
        }
    }
}

/// An ordered collection of sheets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workbook {
    /// Provenance (absent on workbooks from other tools).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<WorkbookMeta>,
    /// Sheets in file order.
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Sheet names in file order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Replace the sheet with the same name in place, or append it.
    pub fn upsert_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(existing) => *existing = sheet,
            None => self.sheets.push(sheet),
        }
    }
}
