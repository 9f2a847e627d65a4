//! # Manifest Tables
//!
//! Materializes a tabular manifest and normalizes it into the uniform,
//! string-typed form the validator consumes.
//!
//! ## Pipeline
//!
//! 1. A [`ManifestSource`] produces a [`RawTable`]: header plus rows of raw
//!    JSON cells. CSV files and readers yield string cells; in-memory tables
//!    may carry numbers or booleans.
//! 2. [`ManifestTable::normalize`] drops unnamed columns and all-blank
//!    rows, stringifies and trims every cell, and explodes list-valued
//!    columns into sequences of trimmed tokens.
//!
//! Header names must be unique after trimming; a repeated name would let
//! one column's cells shadow another's.
//!
//! Dropped rows keep their neighbours' original positions, so reported
//! row numbers always match the spreadsheet the user edited.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use schematic_core::error::ManifestReadError;

/// Offset from a 0-based data row index to the spreadsheet row number
/// (header occupies row 1).
pub const ROW_NUMBER_OFFSET: usize = 2;

/// Separator between items of a list-valued cell.
pub const LIST_SEPARATOR: char = ',';

/// A manifest as read, before any normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column names in file order.
    pub headers: Vec<String>,
    /// Data rows; each has one cell per header.
    pub rows: Vec<Vec<Value>>,
}

impl RawTable {
    /// Build a table from string cells.
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| Value::String(cell.into())).collect())
                .collect(),
        }
    }

    /// Parse comma-separated values from a reader.
    ///
    /// `source_name` labels errors.
    ///
    /// # Errors
    ///
    /// Returns `ManifestReadError::Malformed` for a missing or repeated
    /// header, ragged rows, or invalid UTF-8.
    pub fn from_csv_reader<R: Read>(reader: R, source_name: &str) -> Result<Self, ManifestReadError> {
        let malformed = |reason: String| ManifestReadError::Malformed {
            source_name: source_name.to_string(),
            reason,
        };

        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| malformed(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(malformed("missing header row".into()));
        }
        check_unique_headers(&headers, source_name)?;

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(format!("data row {}: {e}", idx + 1)))?;
            rows.push(record.iter().map(|cell| Value::String(cell.to_string())).collect());
        }
        Ok(Self { headers, rows })
    }

    /// Read a CSV file.
    ///
    /// # Errors
    ///
    /// Returns `ManifestReadError::Io` if the file cannot be opened and
    /// `ManifestReadError::Malformed` if its content is not a table.
    pub fn from_csv_path(path: &Path) -> Result<Self, ManifestReadError> {
        let file = File::open(path).map_err(|source| ManifestReadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_csv_reader(file, &path.display().to_string())
    }

    /// Reject header names that repeat after trimming. Unnamed columns
    /// are exempt since normalization drops them.
    ///
    /// # Errors
    ///
    /// Returns `ManifestReadError::Malformed` naming the first repeat.
    pub fn check_headers(&self, source_name: &str) -> Result<(), ManifestReadError> {
        check_unique_headers(&self.headers, source_name)
    }
}

fn check_unique_headers(headers: &[String], source_name: &str) -> Result<(), ManifestReadError> {
    let mut seen = HashSet::new();
    for header in headers.iter().map(|h| h.trim()).filter(|h| !h.is_empty()) {
        if !seen.insert(header) {
            return Err(ManifestReadError::Malformed {
                source_name: source_name.to_string(),
                reason: format!("duplicate column '{header}'"),
            });
        }
    }
    Ok(())
}

/// Anything that can materialize a manifest.
pub trait ManifestSource {
    /// Name used in logs and error messages.
    fn name(&self) -> String;

    /// Produce the raw table.
    ///
    /// # Errors
    ///
    /// Returns `ManifestReadError` when the content cannot be read as a table.
    fn read_table(&self) -> Result<RawTable, ManifestReadError>;
}

/// A manifest stored as a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvManifest {
    path: PathBuf,
}

impl CsvManifest {
    /// A manifest read from `path` on demand.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestSource for CsvManifest {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_table(&self) -> Result<RawTable, ManifestReadError> {
        RawTable::from_csv_path(&self.path)
    }
}

impl ManifestSource for RawTable {
    fn name(&self) -> String {
        "<in-memory table>".to_string()
    }

    fn read_table(&self) -> Result<RawTable, ManifestReadError> {
        Ok(self.clone())
    }
}

/// One normalized data row.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestRow {
    /// 0-based position among the source's data rows.
    pub index: usize,
    /// Column name to normalized cell (string, or array of strings).
    pub cells: Map<String, Value>,
}

impl ManifestRow {
    /// Spreadsheet row number used in error reports.
    pub fn row_number(&self) -> usize {
        self.index + ROW_NUMBER_OFFSET
    }

    /// Normalized cell of `column`, if the column was kept.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// The row as a single JSON record.
    pub fn to_record(&self) -> Value {
        Value::Object(self.cells.clone())
    }
}

/// A normalized manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestTable {
    headers: Vec<String>,
    rows: Vec<ManifestRow>,
}

impl ManifestTable {
    /// Clean and normalize a raw table.
    ///
    /// Columns with an empty header are dropped whatever they contain, and
    /// a row is blank when every kept cell is. Cells of columns named in
    /// `list_columns` become arrays of trimmed tokens; an empty cell becomes
    /// an empty array. Headers are expected to be unique (see
    /// [`RawTable::check_headers`]); a repeated name keeps its last cell.
    pub fn normalize(raw: RawTable, list_columns: &HashSet<String>) -> Self {
        let RawTable { headers, rows } = raw;
        let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

        let keep: Vec<usize> = (0..headers.len())
            .filter(|&col| !headers[col].is_empty())
            .collect();
        let dropped_columns = headers.len() - keep.len();

        let mut normalized = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if keep.iter().all(|&col| row.get(col).map_or(true, is_blank)) {
                continue;
            }
            let mut cells = Map::new();
            for &col in &keep {
                let text = row.get(col).map(stringify).unwrap_or_default();
                let cell = if list_columns.contains(&headers[col]) {
                    split_list(&text)
                } else {
                    Value::String(text)
                };
                cells.insert(headers[col].clone(), cell);
            }
            normalized.push(ManifestRow { index, cells });
        }

        let headers: Vec<String> = keep.into_iter().map(|col| headers[col].clone()).collect();
        tracing::debug!(
            columns = headers.len(),
            rows = normalized.len(),
            dropped_columns,
            "normalized manifest"
        );
        Self {
            headers,
            rows: normalized,
        }
    }

    /// Kept column names, trimmed, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Non-blank rows in file order.
    pub fn rows(&self) -> &[ManifestRow] {
        &self.rows
    }

    /// Number of non-blank rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a kept column is named `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Uniform string form of a cell, trimmed.
fn stringify(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn is_blank(cell: &Value) -> bool {
    stringify(cell).is_empty()
}

/// Split a list cell on commas, trimming each token.
pub fn split_list(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Array(Vec::new());
    }
    Value::Array(
        text.split(LIST_SEPARATOR)
            .map(|token| Value::String(token.trim().to_string()))
            .collect(),
    )
}
