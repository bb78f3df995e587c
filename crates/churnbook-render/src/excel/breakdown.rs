//! Categorical breakdown sheets (contract type, payment method)

use churnbook_core::templates::{
    columns, CategoricalBreakdown, ChartSpec, CHURNED, MONTHS_PER_YEAR,
};
use churnbook_core::{RawLayout, RenderError, SheetSummary};
use rust_xlsxwriter::{Chart, ChartType, ConditionalFormat2ColorScale, Workbook};

use super::writer::{format_err, SheetWriter};
use super::{write_headers, ChurnReportRenderer, ReportFormats, SCALE_HIGH, SCALE_LOW};
use crate::formula;

/// Zero-based row of the table header; categories start on the next row
const HEADER_ROW: u32 = 2;
const RATE_COL: u16 = 4;

impl ChurnReportRenderer {
    /// Add a count/churn/revenue table over the breakdown's categories
    pub(crate) fn add_breakdown_sheet(
        &self,
        workbook: &mut Workbook,
        layout: &RawLayout,
        formats: &ReportFormats,
        breakdown: &CategoricalBreakdown,
    ) -> Result<SheetSummary, RenderError> {
        let mut sheet = SheetWriter::add(workbook, breakdown.sheet)?;

        sheet.merge(0, 0, 5, breakdown.title, &formats.title)?;
        write_headers(
            &mut sheet,
            HEADER_ROW,
            &[
                breakdown.category_header,
                "Total",
                "Churned",
                "Retained",
                "Churn Rate",
                "Revenue at Risk",
            ],
            &formats.header,
        )?;

        let category = layout.range(breakdown.column)?;
        let churn = layout.range(columns::CHURN)?;
        let charges = layout.range(columns::MONTHLY_CHARGES)?;

        let first_row = HEADER_ROW + 1;
        let mut row = first_row;
        for value in breakdown.categories {
            let r = row + 1;
            let churned = [(&category, formula::text(value)), (&churn, formula::text(CHURNED))];

            sheet.text_with(row, 0, value, &formats.cell)?;
            sheet.formula(row, 1, &format!("={}", formula::count_if(&category, value)), &formats.cell)?;
            sheet.formula(row, 2, &format!("={}", formula::count_ifs(&churned)), &formats.cell)?;
            sheet.formula(row, 3, &format!("=B{r}-C{r}"), &formats.cell)?;
            sheet.formula(row, RATE_COL, &format!("=C{r}/B{r}"), &formats.percent)?;
            sheet.formula(
                row,
                5,
                &format!("={}*{MONTHS_PER_YEAR}", formula::sum_ifs(&charges, &churned)),
                &formats.money,
            )?;
            row += 1;
        }
        let last_row = row - 1;

        // Totals: sums of each column, rate recomputed from the summed counts
        let (first, last, t) = (first_row + 1, last_row + 1, row + 1);
        sheet.text_with(row, 0, "TOTAL", &formats.total)?;
        for (col, letter) in [(1u16, 'B'), (2, 'C'), (3, 'D')] {
            sheet.formula(
                row,
                col,
                &format!("=SUM({letter}{first}:{letter}{last})"),
                &formats.total,
            )?;
        }
        sheet.formula(row, RATE_COL, &format!("=C{t}/B{t}"), &formats.total_percent)?;
        sheet.formula(row, 5, &format!("=SUM(F{first}:F{last})"), &formats.total_money)?;

        let scale = ConditionalFormat2ColorScale::new()
            .set_minimum_color(SCALE_LOW)
            .set_maximum_color(SCALE_HIGH);
        sheet
            .worksheet()
            .add_conditional_format(first_row, RATE_COL, last_row, RATE_COL, &scale)
            .map_err(format_err)?;

        if let Some(spec) = &breakdown.chart {
            let chart = rate_chart(
                ChartType::Column,
                spec,
                breakdown.sheet,
                first_row,
                last_row,
                RATE_COL,
            );
            sheet
                .worksheet()
                .insert_chart(HEADER_ROW, 7, &chart)
                .map_err(format_err)?;
        }

        self.finish_sheet(sheet)
    }
}

/// Single-series chart of a rate column against the labels in column A.
///
/// The series name is the header cell above the rate column.
pub(crate) fn rate_chart(
    chart_type: ChartType,
    spec: &ChartSpec,
    sheet: &str,
    first_row: u32,
    last_row: u32,
    rate_col: u16,
) -> Chart {
    let mut chart = Chart::new(chart_type);
    chart
        .add_series()
        .set_name((sheet, first_row - 1, rate_col))
        .set_categories((sheet, first_row, 0, last_row, 0))
        .set_values((sheet, first_row, rate_col, last_row, rate_col));

    chart.title().set_name(spec.title);
    chart.y_axis().set_name(spec.y_axis);
    if let Some(x_axis) = spec.x_axis {
        chart.x_axis().set_name(x_axis);
    }
    chart.set_style(10);
    chart.set_width(spec.width);
    chart.set_height(spec.height);
    chart
}
