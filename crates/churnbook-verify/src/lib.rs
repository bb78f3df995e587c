//! # churnbook-verify
//!
//! Formula census for a persisted churn workbook.
//!
//! Reopens an xlsx file, counts the formula cells of every sheet in workbook
//! order and keeps the first two of each (row-major) as samples. The result
//! renders as the fixed text report through `Display`, or serializes to JSON.
//!
//! ```rust,ignore
//! let scan = churnbook_verify::scan_path("excel/churn_analysis_dynamic.xlsx")?;
//! print!("{scan}");
//! ```

use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx, XlsxError};
use churnbook_core::cell_ref;
use serde::Serialize;
use thiserror::Error;

/// Formula cells kept per sheet as examples
pub const SAMPLES_PER_SHEET: usize = 2;

const RULE_WIDTH: usize = 70;

/// Verification errors
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Cannot open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    #[error("Cannot read sheet {sheet}: {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: XlsxError,
    },

    #[error("Invalid workbook: {0}")]
    Workbook(#[from] XlsxError),
}

/// One formula cell, e.g. `B6: =COUNTA(Raw_Data!A2:A7044)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormulaSample {
    pub cell: String,
    pub formula: String,
}

impl fmt::Display for FormulaSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.cell, self.formula)
    }
}

/// Formula census of one sheet
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetScan {
    pub name: String,
    pub formulas: usize,
    pub samples: Vec<FormulaSample>,
}

impl SheetScan {
    /// `[OK]` when the sheet holds formulas, `[--]` otherwise
    pub fn status(&self) -> &'static str {
        if self.formulas > 0 {
            "[OK]"
        } else {
            "[--]"
        }
    }
}

/// Formula census of a whole workbook
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkbookScan {
    pub sheets: Vec<SheetScan>,
    pub total: usize,
}

impl WorkbookScan {
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetScan> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for WorkbookScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "EXCEL FORMULA VERIFICATION - Customer Churn Analysis")?;
        writeln!(f, "{rule}")?;

        let names: Vec<String> = self.sheets.iter().map(|s| format!("'{}'", s.name)).collect();
        writeln!(f)?;
        writeln!(f, "Sheets: [{}]", names.join(", "))?;

        writeln!(f)?;
        writeln!(f, "[FORMULA COUNT PER SHEET]")?;
        for sheet in &self.sheets {
            writeln!(f, "   {} {}: {} formulas", sheet.status(), sheet.name, sheet.formulas)?;
            for sample in &sheet.samples {
                writeln!(f, "       Example: {sample}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "Total formulas in workbook: {}", self.total)?;
        writeln!(f, "{rule}")
    }
}

/// Scan a workbook on disk
pub fn scan_path(path: impl AsRef<Path>) -> Result<WorkbookScan, VerifyError> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| VerifyError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "opened workbook");
    scan(&mut workbook)
}

/// Scan an in-memory xlsx
pub fn scan_bytes(bytes: &[u8]) -> Result<WorkbookScan, VerifyError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    scan(&mut workbook)
}

/// Count formula cells of every sheet in workbook order
pub fn scan<RS: Read + Seek>(workbook: &mut Xlsx<RS>) -> Result<WorkbookScan, VerifyError> {
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_formula(&name)
            .map_err(|source| VerifyError::Sheet {
                sheet: name.clone(),
                source,
            })?;
        let (row0, col0) = range.start().unwrap_or((0, 0));

        let mut formulas = 0;
        let mut samples = Vec::with_capacity(SAMPLES_PER_SHEET);
        // used_cells walks rows top to bottom, columns left to right
        for (row, col, text) in range.used_cells() {
            if text.is_empty() {
                continue;
            }
            formulas += 1;
            if samples.len() < SAMPLES_PER_SHEET {
                let row = row0 + row as u32;
                let col = u16::try_from(col0 as usize + col).unwrap_or(u16::MAX);
                samples.push(FormulaSample {
                    cell: cell_ref(row, col),
                    formula: format!("={}", text.trim_start_matches('=')),
                });
            }
        }

        tracing::debug!(sheet = %name, formulas, "scanned sheet");
        sheets.push(SheetScan {
            name,
            formulas,
            samples,
        });
    }

    let total = sheets.iter().map(|s| s.formulas).sum();
    Ok(WorkbookScan { sheets, total })
}
