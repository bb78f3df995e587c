//! Cell writer that tracks formula counts and column widths per sheet

use std::collections::BTreeMap;

use churnbook_core::{RenderError, SheetSummary};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

pub(crate) fn format_err(e: XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}

/// Wraps one worksheet while it is being built.
///
/// Every write goes through here so the sheet can be auto-sized at the end
/// (`min(longest text + 2, max_width)` per column, formula text included)
/// and the number of formula cells is known without reopening the file.
pub(crate) struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    name: String,
    widths: BTreeMap<u16, usize>,
    formulas: usize,
}

impl<'a> SheetWriter<'a> {
    pub(crate) fn add(workbook: &'a mut Workbook, name: &str) -> Result<Self, RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).map_err(format_err)?;
        Ok(Self {
            sheet,
            name: name.to_string(),
            widths: BTreeMap::new(),
            formulas: 0,
        })
    }

    fn track(&mut self, col: u16, len: usize) {
        let width = self.widths.entry(col).or_default();
        *width = (*width).max(len);
    }

    pub(crate) fn text(&mut self, row: u32, col: u16, text: &str) -> Result<(), RenderError> {
        self.sheet.write_string(row, col, text).map_err(format_err)?;
        self.track(col, text.chars().count());
        Ok(())
    }

    pub(crate) fn text_with(
        &mut self,
        row: u32,
        col: u16,
        text: &str,
        format: &Format,
    ) -> Result<(), RenderError> {
        self.sheet
            .write_string_with_format(row, col, text, format)
            .map_err(format_err)?;
        self.track(col, text.chars().count());
        Ok(())
    }

    pub(crate) fn number(&mut self, row: u32, col: u16, value: f64) -> Result<(), RenderError> {
        self.sheet.write_number(row, col, value).map_err(format_err)?;
        self.track(col, value.to_string().chars().count());
        Ok(())
    }

    pub(crate) fn number_with(
        &mut self,
        row: u32,
        col: u16,
        value: f64,
        format: &Format,
    ) -> Result<(), RenderError> {
        self.sheet
            .write_number_with_format(row, col, value, format)
            .map_err(format_err)?;
        self.track(col, value.to_string().chars().count());
        Ok(())
    }

    /// Write a formula; `formula` must start with `=`
    pub(crate) fn formula(
        &mut self,
        row: u32,
        col: u16,
        formula: &str,
        format: &Format,
    ) -> Result<(), RenderError> {
        debug_assert!(formula.starts_with('='), "formula without '=': {formula}");
        self.sheet
            .write_formula_with_format(row, col, formula, format)
            .map_err(format_err)?;
        self.track(col, formula.chars().count());
        self.formulas += 1;
        Ok(())
    }

    /// Merge a single-row span and write the text into it
    pub(crate) fn merge(
        &mut self,
        row: u32,
        first_col: u16,
        last_col: u16,
        text: &str,
        format: &Format,
    ) -> Result<(), RenderError> {
        self.sheet
            .merge_range(row, first_col, row, last_col, text, format)
            .map_err(format_err)?;
        self.track(first_col, text.chars().count());
        Ok(())
    }

    /// Direct access for charts and conditional formats
    pub(crate) fn worksheet(&mut self) -> &mut Worksheet {
        &mut *self.sheet
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Apply column widths and report what was written
    pub(crate) fn finish(mut self, max_width: u16) -> Result<SheetSummary, RenderError> {
        for (&col, &len) in &self.widths {
            if len == 0 {
                continue;
            }
            let width = (len + 2).min(usize::from(max_width)) as u16;
            self.sheet
                .set_column_width(col, f64::from(width))
                .map_err(format_err)?;
        }
        Ok(SheetSummary {
            name: self.name,
            formulas: self.formulas,
        })
    }
}
