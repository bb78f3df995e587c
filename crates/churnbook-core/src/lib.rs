//! # churnbook-core
//!
//! Core data model and traits for the churnbook report generator.
//!
//! This crate provides:
//! - The in-memory customer table: `RawTable`, `RawValue`
//! - Column addressing for formulas: `RawLayout`, `RawRange`, `col_to_letter`
//! - Fixed report definitions in [`templates`]
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use churnbook_core::{RawLayout, RawTable, RawValue};
//!
//! let mut table = RawTable::new(vec![
//!     "customerID".into(), "tenure".into(), "Churn".into(),
//! ]);
//! table.push_row(vec![
//!     RawValue::infer("0001-A"), RawValue::infer("5"), RawValue::infer("Yes"),
//! ]);
//!
//! let layout = RawLayout::for_columns(&table, &["customerID", "Churn"]).unwrap();
//! assert_eq!(layout.range("Churn").unwrap().to_string(), "Raw_Data!C2:C2");
//! ```

pub mod templates;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use templates::{columns, sheets};

// ============================================================================
// Raw Table
// ============================================================================

/// A single cell of the customer table
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Empty,
}

impl RawValue {
    /// Infer the cell type from a CSV field.
    ///
    /// Blank fields become `Empty`, anything `f64` accepts becomes `Number`,
    /// everything else is kept verbatim as `Text`.
    pub fn infer(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(field.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text shown in the cell, used for column sizing
    pub fn display_len(&self) -> usize {
        match self {
            Self::Number(n) => n.to_string().chars().count(),
            Self::Text(s) => s.chars().count(),
            Self::Empty => 0,
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::infer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Ordered customer records with their header row.
///
/// Column order is kept exactly as loaded; formulas address columns by
/// their position in this table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a record. Short rows are padded with `Empty`.
    pub fn push_row(&mut self, mut row: Vec<RawValue>) {
        if row.len() < self.headers.len() {
            row.resize(self.headers.len(), RawValue::Empty);
        }
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    /// Number of records (header excluded)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-based position of a column by exact header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Iterate over one column's values
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &RawValue> + '_> {
        static EMPTY: RawValue = RawValue::Empty;
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row.get(idx).unwrap_or(&EMPTY)))
    }
}

// ============================================================================
// Cell Addressing
// ============================================================================

/// Convert a zero-based column index to spreadsheet letters (0 -> A, 26 -> AA)
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col) + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// A1-style reference for zero-based row/column
pub fn cell_ref(row: u32, col: u16) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// A single-column range on the raw data sheet, e.g. `Raw_Data!U2:U7044`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRange {
    pub sheet: &'static str,
    pub column: String,
    pub first_row: u32,
    pub last_row: u32,
}

impl fmt::Display for RawRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{sheet}!{col}{first}:{col}{last}",
            sheet = self.sheet,
            col = self.column,
            first = self.first_row,
            last = self.last_row
        )
    }
}

/// Column letters and data row bounds of the raw data sheet.
///
/// Built from the loaded table, so formula ranges always cover exactly the
/// records written to `Raw_Data`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawLayout {
    letters: HashMap<String, String>,
    first_row: u32,
    last_row: u32,
}

impl RawLayout {
    /// Resolve the layout, requiring every column the reports reference
    pub fn resolve(table: &RawTable) -> Result<Self, RenderError> {
        Self::for_columns(table, columns::REQUIRED)
    }

    /// Resolve the layout, requiring the given columns to be present
    pub fn for_columns(table: &RawTable, required: &[&str]) -> Result<Self, RenderError> {
        if let Some(missing) = required.iter().find(|c| table.column_index(c).is_none()) {
            return Err(RenderError::MissingColumn((*missing).to_string()));
        }
        if table.headers().len() > usize::from(u16::MAX) {
            return Err(RenderError::InvalidData(format!(
                "too many columns: {}",
                table.headers().len()
            )));
        }

        // The first occurrence wins, matching column_index
        let mut letters = HashMap::new();
        for (idx, header) in table.headers().iter().enumerate() {
            letters
                .entry(header.clone())
                .or_insert_with(|| col_to_letter(idx as u16));
        }

        let records = u32::try_from(table.len())
            .map_err(|_| RenderError::InvalidData(format!("too many records: {}", table.len())))?;

        Ok(Self {
            letters,
            first_row: 2,
            // An empty table still gets a one-row range below the header
            last_row: records.saturating_add(1).max(2),
        })
    }

    pub fn first_row(&self) -> u32 {
        self.first_row
    }

    pub fn last_row(&self) -> u32 {
        self.last_row
    }

    pub fn letter(&self, column: &str) -> Option<&str> {
        self.letters.get(column).map(String::as_str)
    }

    /// Data range of a named column on the raw data sheet
    pub fn range(&self, column: &str) -> Result<RawRange, RenderError> {
        let letter = self
            .letter(column)
            .ok_or_else(|| RenderError::MissingColumn(column.to_string()))?;
        Ok(RawRange {
            sheet: sheets::RAW_DATA,
            column: letter.to_string(),
            first_row: self.first_row,
            last_row: self.last_row,
        })
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render a customer table to the output format
    fn render(&self, table: &RawTable) -> Result<Self::Output, RenderError>;
}

/// Formula cells written to one sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub formulas: usize,
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================
