//! Raw_Data sheet: the customer table, verbatim

use churnbook_core::templates::sheets;
use churnbook_core::{RawTable, RawValue, RenderError, SheetSummary};
use rust_xlsxwriter::Workbook;

use super::writer::SheetWriter;
use super::{ChurnReportRenderer, ReportFormats};

impl ChurnReportRenderer {
    /// Add the raw data sheet every formula in the workbook reads from.
    ///
    /// Rows keep their loaded order; header on row 1, records from row 2.
    pub(crate) fn add_raw_data_sheet(
        &self,
        workbook: &mut Workbook,
        table: &RawTable,
        formats: &ReportFormats,
    ) -> Result<SheetSummary, RenderError> {
        let mut sheet = SheetWriter::add(workbook, sheets::RAW_DATA)?;

        for (col, header) in table.headers().iter().enumerate() {
            sheet.text_with(0, col as u16, header, &formats.raw_header)?;
        }

        for (idx, record) in table.rows().iter().enumerate() {
            let row = idx as u32 + 1;
            for (col, value) in record.iter().enumerate() {
                match value {
                    RawValue::Number(n) => sheet.number(row, col as u16, *n)?,
                    RawValue::Text(s) => sheet.text(row, col as u16, s)?,
                    RawValue::Empty => {}
                }
            }
        }

        self.finish_sheet(sheet)
    }
}
