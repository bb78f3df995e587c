//! Churn_by_Tenure sheet

use churnbook_core::templates::{columns, sheets, CHURNED, TENURE_BUCKETS, TENURE_CHART};
use churnbook_core::{RawLayout, RenderError, SheetSummary};
use rust_xlsxwriter::{ChartType, ConditionalFormat2ColorScale, Workbook};

use super::breakdown::rate_chart;
use super::writer::{format_err, SheetWriter};
use super::{write_headers, ChurnReportRenderer, ReportFormats, SCALE_HIGH, SCALE_LOW};
use crate::formula;

const HEADER_ROW: u32 = 2;
const RATE_COL: u16 = 5;

impl ChurnReportRenderer {
    /// Add tenure bucket sheet.
    ///
    /// Bucket bounds are written as literal numbers in columns B and C and
    /// the counting formulas compare tenure against those cells, so editing
    /// a bound in the sheet re-buckets the data.
    pub(crate) fn add_tenure_sheet(
        &self,
        workbook: &mut Workbook,
        layout: &RawLayout,
        formats: &ReportFormats,
    ) -> Result<SheetSummary, RenderError> {
        let mut sheet = SheetWriter::add(workbook, sheets::CHURN_BY_TENURE)?;

        sheet.merge(0, 0, 5, "CHURN ANALYSIS BY CUSTOMER TENURE", &formats.title)?;
        write_headers(
            &mut sheet,
            HEADER_ROW,
            &[
                "Tenure Bucket",
                "Min Months",
                "Max Months",
                "Customers",
                "Churned",
                "Churn Rate",
            ],
            &formats.header,
        )?;

        let tenure = layout.range(columns::TENURE)?;
        let churn = layout.range(columns::CHURN)?;

        let first_row = HEADER_ROW + 1;
        let mut row = first_row;
        for bucket in TENURE_BUCKETS {
            let r = row + 1;
            let in_bucket = [
                (&tenure, formula::compare_cell(">=", &format!("B{r}"))),
                (&tenure, formula::compare_cell("<=", &format!("C{r}"))),
            ];
            let churned_in_bucket = [
                in_bucket[0].clone(),
                in_bucket[1].clone(),
                (&churn, formula::text(CHURNED)),
            ];

            sheet.text_with(row, 0, bucket.label, &formats.cell)?;
            sheet.number_with(row, 1, f64::from(bucket.min_months), &formats.cell)?;
            sheet.number_with(row, 2, f64::from(bucket.max_months), &formats.cell)?;
            sheet.formula(row, 3, &format!("={}", formula::count_ifs(&in_bucket)), &formats.cell)?;
            sheet.formula(
                row,
                4,
                &format!("={}", formula::count_ifs(&churned_in_bucket)),
                &formats.cell,
            )?;
            sheet.formula(
                row,
                RATE_COL,
                &format!("={}", formula::guarded_ratio(&format!("E{r}"), &format!("D{r}"))),
                &formats.percent,
            )?;
            row += 1;
        }
        let last_row = row - 1;

        let scale = ConditionalFormat2ColorScale::new()
            .set_minimum_color(SCALE_LOW)
            .set_maximum_color(SCALE_HIGH);
        sheet
            .worksheet()
            .add_conditional_format(first_row, RATE_COL, last_row, RATE_COL, &scale)
            .map_err(format_err)?;

        let insight_row = last_row + 2;
        sheet.text_with(insight_row, 0, "KEY INSIGHT:", &formats.bold)?;
        sheet.text(
            insight_row + 1,
            0,
            "New customers (0-12 months) have the highest churn risk.",
        )?;
        sheet.text(
            insight_row + 2,
            0,
            "Focus retention efforts on the first year of customer relationship.",
        )?;

        let chart = rate_chart(
            ChartType::Line,
            &TENURE_CHART,
            sheets::CHURN_BY_TENURE,
            first_row,
            last_row,
            RATE_COL,
        );
        sheet
            .worksheet()
            .insert_chart(HEADER_ROW, 7, &chart)
            .map_err(format_err)?;

        self.finish_sheet(sheet)
    }
}
