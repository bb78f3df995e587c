//! Service_Impact sheet

use churnbook_core::templates::{columns, sheets, CHURNED, HAS_SERVICE, NO_SERVICE, SERVICES};
use churnbook_core::{RawLayout, RenderError, SheetSummary};
use rust_xlsxwriter::Workbook;

use super::writer::SheetWriter;
use super::{write_headers, ChurnReportRenderer, ReportFormats};
use crate::formula;

const HEADER_ROW: u32 = 2;

impl ChurnReportRenderer {
    /// Add service impact sheet.
    ///
    /// Both churn-rate columns return 0 for an empty population instead of
    /// `#DIV/0!`.
    pub(crate) fn add_service_impact_sheet(
        &self,
        workbook: &mut Workbook,
        layout: &RawLayout,
        formats: &ReportFormats,
    ) -> Result<SheetSummary, RenderError> {
        let mut sheet = SheetWriter::add(workbook, sheets::SERVICE_IMPACT)?;

        sheet.merge(0, 0, 5, "CHURN IMPACT BY SERVICE SUBSCRIPTIONS", &formats.title)?;
        write_headers(
            &mut sheet,
            HEADER_ROW,
            &[
                "Service",
                "Has Service",
                "Churned",
                "Churn Rate",
                "Without Service",
                "Churn Rate (No)",
            ],
            &formats.header,
        )?;

        let churn = layout.range(columns::CHURN)?;

        let mut row = HEADER_ROW + 1;
        for service in SERVICES {
            let r = row + 1;
            let flag = layout.range(service.column)?;
            let churned_with = formula::count_ifs(&[
                (&flag, formula::text(HAS_SERVICE)),
                (&churn, formula::text(CHURNED)),
            ]);
            let churned_without = formula::count_ifs(&[
                (&flag, formula::text(NO_SERVICE)),
                (&churn, formula::text(CHURNED)),
            ]);

            sheet.text_with(row, 0, service.name, &formats.cell)?;
            sheet.formula(
                row,
                1,
                &format!("={}", formula::count_if(&flag, HAS_SERVICE)),
                &formats.cell,
            )?;
            sheet.formula(row, 2, &format!("={churned_with}"), &formats.cell)?;
            sheet.formula(
                row,
                3,
                &format!("={}", formula::guarded_ratio(&format!("C{r}"), &format!("B{r}"))),
                &formats.percent,
            )?;
            sheet.formula(
                row,
                4,
                &format!("={}", formula::count_if(&flag, NO_SERVICE)),
                &formats.cell,
            )?;
            sheet.formula(
                row,
                5,
                &format!("={}", formula::guarded_ratio(&churned_without, &format!("E{r}"))),
                &formats.percent,
            )?;
            row += 1;
        }

        let insight_row = row + 1;
        sheet.text_with(
            insight_row,
            0,
            "INSIGHT: Customers WITHOUT these services have higher churn rates.",
            &formats.insight,
        )?;
        sheet.text(
            insight_row + 1,
            0,
            "Recommendation: Upsell protective services to reduce churn risk.",
        )?;

        self.finish_sheet(sheet)
    }
}
