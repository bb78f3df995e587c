//! Dashboard sheet: single-cell KPIs

use churnbook_core::templates::{columns, sheets, CHURNED, MONTHS_PER_YEAR, RETAINED};
use churnbook_core::{RawLayout, RenderError, SheetSummary};
use rust_xlsxwriter::Workbook;

use super::writer::SheetWriter;
use super::{ChurnReportRenderer, ReportFormats};
use crate::formula;

/// How a KPI value cell is displayed
#[derive(Clone, Copy)]
enum KpiKind {
    Count,
    Rate,
    Money,
}

/// One label/value pair of the KPI grid (zero-based row, label column)
struct Kpi {
    row: u32,
    col: u16,
    label: String,
    formula: String,
    kind: KpiKind,
}

impl Kpi {
    fn new(row: u32, col: u16, label: &str, formula: String, kind: KpiKind) -> Self {
        Self {
            row,
            col,
            label: label.to_string(),
            formula,
            kind,
        }
    }
}

impl ChurnReportRenderer {
    /// Add Dashboard sheet
    pub(crate) fn add_dashboard_sheet(
        &self,
        workbook: &mut Workbook,
        layout: &RawLayout,
        formats: &ReportFormats,
    ) -> Result<SheetSummary, RenderError> {
        let mut sheet = SheetWriter::add(workbook, sheets::DASHBOARD)?;

        sheet.merge(0, 0, 6, "CUSTOMER CHURN ANALYSIS DASHBOARD", &formats.dashboard_title)?;

        let date = self
            .analysis_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        sheet.text_with(
            1,
            0,
            &format!("Analysis Date: {}", date.format("%B %d, %Y")),
            &formats.subtitle,
        )?;

        sheet.text_with(3, 0, "KEY PERFORMANCE INDICATORS", &formats.title)?;

        let ids = layout.range(columns::CUSTOMER_ID)?;
        let churn = layout.range(columns::CHURN)?;
        let charges = layout.range(columns::MONTHLY_CHARGES)?;

        // Ratios and the annual figure point at other KPI cells: D6 churned,
        // F6 retained, B6 total, D10 revenue at risk.
        let kpis = [
            Kpi::new(5, 0, "Total Customers", formula::count_a(&ids), KpiKind::Count),
            Kpi::new(5, 2, "Churned", formula::count_if(&churn, CHURNED), KpiKind::Count),
            Kpi::new(5, 4, "Retained", formula::count_if(&churn, RETAINED), KpiKind::Count),
            Kpi::new(7, 0, "Churn Rate", "D6/B6".into(), KpiKind::Rate),
            Kpi::new(7, 2, "Retention Rate", "F6/B6".into(), KpiKind::Rate),
            Kpi::new(7, 4, "Avg Monthly Charges", formula::average(&charges), KpiKind::Money),
            Kpi::new(9, 0, "Total Monthly Revenue", formula::sum(&charges), KpiKind::Money),
            Kpi::new(
                9,
                2,
                "Revenue at Risk",
                formula::sum_if(&churn, CHURNED, &charges),
                KpiKind::Money,
            ),
            Kpi::new(
                9,
                4,
                &format!("Annual Risk ({})", self.currency),
                format!("D10*{MONTHS_PER_YEAR}"),
                KpiKind::Money,
            ),
        ];

        for kpi in &kpis {
            sheet.text_with(kpi.row, kpi.col, &kpi.label, &formats.kpi_label)?;
            let value_format = match kpi.kind {
                KpiKind::Count => &formats.kpi_value,
                KpiKind::Rate => &formats.kpi_percent,
                KpiKind::Money => &formats.kpi_money,
            };
            sheet.formula(kpi.row, kpi.col + 1, &format!("={}", kpi.formula), value_format)?;
        }

        sheet.text_with(12, 0, "KEY INSIGHT", &formats.title)?;
        sheet.text(
            13,
            0,
            "Revenue at Risk Formula: =SUMIF(Churn='Yes', MonthlyCharges) * 12",
        )?;
        sheet.text(
            14,
            0,
            "This represents annual revenue that could be lost if all at-risk customers churn.",
        )?;

        self.finish_sheet(sheet)
    }
}
