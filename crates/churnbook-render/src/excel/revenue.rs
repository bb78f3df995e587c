//! Revenue_Analysis sheet: revenue metrics and retention scenarios

use churnbook_core::templates::{columns, sheets, CHURNED, MONTHS_PER_YEAR, RETAINED};
use churnbook_core::{RawLayout, RenderError, SheetSummary};
use rust_xlsxwriter::{Format, Workbook};

use super::writer::SheetWriter;
use super::{ChurnReportRenderer, ReportFormats};
use crate::formula;

/// Zero-based row of the first metric (B4)
const FIRST_METRIC_ROW: u32 = 3;
/// Cell holding annual revenue at risk, read by every scenario row
const ANNUAL_RISK_CELL: &str = "B8";
const SCENARIO_TITLE_ROW: u32 = 12;
const SCENARIO_HEADER_ROW: u32 = 14;

impl ChurnReportRenderer {
    /// Add revenue analysis sheet
    pub(crate) fn add_revenue_sheet(
        &self,
        workbook: &mut Workbook,
        layout: &RawLayout,
        formats: &ReportFormats,
    ) -> Result<SheetSummary, RenderError> {
        let mut sheet = SheetWriter::add(workbook, sheets::REVENUE_ANALYSIS)?;

        sheet.merge(0, 0, 3, "REVENUE AT RISK ANALYSIS", &formats.title)?;

        let churn = layout.range(columns::CHURN)?;
        let charges = layout.range(columns::MONTHLY_CHARGES)?;

        // Rows 4..=10; "Monthly Revenue at Risk" (B7) mirrors B5 and the
        // annual figure (B8) multiplies it out.
        let metrics: [(&str, String, &Format); 7] = [
            ("Total Monthly Revenue", formula::sum(&charges), &formats.metric_money),
            (
                "Revenue from Churned",
                formula::sum_if(&churn, CHURNED, &charges),
                &formats.metric_money,
            ),
            (
                "Revenue from Retained",
                formula::sum_if(&churn, RETAINED, &charges),
                &formats.metric_money,
            ),
            ("Monthly Revenue at Risk", "B5".into(), &formats.metric_money),
            (
                "Annual Revenue at Risk",
                format!("B7*{MONTHS_PER_YEAR}"),
                &formats.metric_money,
            ),
            (
                "Avg Charges (Churned)",
                formula::average_if(&churn, CHURNED, &charges),
                &formats.metric_money_cents,
            ),
            (
                "Avg Charges (Retained)",
                formula::average_if(&churn, RETAINED, &charges),
                &formats.metric_money_cents,
            ),
        ];

        for (offset, (label, text, format)) in metrics.iter().enumerate() {
            let row = FIRST_METRIC_ROW + offset as u32;
            sheet.text_with(row, 0, label, &formats.metric_label)?;
            sheet.formula(row, 1, &format!("={text}"), format)?;
        }

        sheet.text_with(SCENARIO_TITLE_ROW, 0, "RETENTION SCENARIO ANALYSIS", &formats.title)?;
        sheet.text_with(SCENARIO_HEADER_ROW, 0, "If we retain", &formats.bold)?;
        sheet.text_with(SCENARIO_HEADER_ROW, 1, "We save annually", &formats.bold)?;

        let mut row = SCENARIO_HEADER_ROW + 1;
        for &percent in &self.retention_scenarios {
            let format = if self.highlight_scenario == Some(percent) {
                &formats.highlight_money
            } else {
                &formats.money
            };
            sheet.text_with(row, 0, &format!("{percent}% of at-risk"), &formats.cell)?;
            sheet.formula(
                row,
                1,
                &format!("={ANNUAL_RISK_CELL}*{}", scenario_factor(percent)),
                format,
            )?;
            row += 1;
        }

        self.finish_sheet(sheet)
    }
}

/// Scenario percentage as a formula literal: 50 -> "0.5", 100 -> "1"
fn scenario_factor(percent: u32) -> String {
    let factor = f64::from(percent) / 100.0;
    factor.to_string()
}
