//! Excel churn report renderer
//!
//! Generates an XLSX workbook whose numbers are all live formulas over the
//! `Raw_Data` sheet:
//! - Dashboard: single-cell KPIs (counts, rates, revenue at risk)
//! - Churn_by_Contract / Churn_by_Payment: per-category counts, churn rate
//!   and annualized revenue at risk, with a totals row
//! - Churn_by_Tenure: fixed month buckets with a zero-guarded churn rate
//! - Service_Impact: churn with and without each add-on service
//! - Revenue_Analysis: revenue metrics and retention scenarios
//! - Raw_Data: the customer table itself
//!
//! ## Formula-driven output
//!
//! No aggregate is computed in Rust. Each builder writes formula text such as
//!
//! ```text
//! =COUNTIFS(Raw_Data!P2:P7044,"One year",Raw_Data!U2:U7044,"Yes")
//! ```
//!
//! and the spreadsheet application evaluates it on open. Column letters and
//! the `2:<records + 1>` row bounds come from [`RawLayout`], resolved from
//! the loaded table before any sheet is built, so the ranges always match
//! what `Raw_Data` contains.
//!
//! `Raw_Data` is written last. Formulas referencing it by name are resolved
//! when the file is opened, not when they are written.
//!
//! ## Example Output Structure
//!
//! ```text
//! Sheet: Churn_by_Contract
//! | Contract Type  | Total | Churned | Retained | Churn Rate | Revenue at Risk |
//! |----------------|-------|---------|----------|------------|-----------------|
//! | Month-to-month | =COUNTIF(..) | =COUNTIFS(..) | =B4-C4 | =C4/B4 | =SUMIFS(..)*12 |
//! | ...            |       |         |          |            |                 |
//! | TOTAL          | =SUM(B4:B6) | =SUM(C4:C6) | =SUM(D4:D6) | =C7/B7 | =SUM(F4:F6) |
//! ```

mod breakdown;
mod dashboard;
mod raw_data;
mod revenue;
mod services;
mod tenure;
mod writer;

use std::path::Path;

use chrono::NaiveDate;
use churnbook_core::templates::{HIGHLIGHT_SCENARIO, RETENTION_SCENARIOS};
use churnbook_core::{RawLayout, RawTable, RenderError, Renderer, SheetSummary};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use serde::Serialize;

use writer::{format_err, SheetWriter};

const TITLE_COLOR: u32 = 0xC65911;
const HEADER_FILL: u32 = 0xC65911;
const SUBHEADER_FILL: u32 = 0xED7D31;
const KPI_FILL: u32 = 0xFBE5D6;
const HIGHLIGHT_FILL: u32 = 0xFFFF00;
const WHITE: u32 = 0xFFFFFF;

/// Color scale applied to churn-rate columns (low is good)
pub(crate) const SCALE_LOW: u32 = 0x63BE7B;
pub(crate) const SCALE_HIGH: u32 = 0xF8696B;

/// Excel churn report renderer
#[derive(Clone, Debug)]
pub struct ChurnReportRenderer {
    /// Currency symbol used in money formats
    pub currency: String,
    /// Date printed under the dashboard title (today if unset)
    pub analysis_date: Option<NaiveDate>,
    /// Percentages of at-risk revenue retained, one scenario row each
    pub retention_scenarios: Vec<u32>,
    /// Scenario row that gets the highlight fill
    pub highlight_scenario: Option<u32>,
    /// Upper bound for auto-sized column widths, in characters
    pub max_column_width: u16,
}

impl Default for ChurnReportRenderer {
    fn default() -> Self {
        Self {
            currency: "$".into(),
            analysis_date: None,
            retention_scenarios: RETENTION_SCENARIOS.to_vec(),
            highlight_scenario: Some(HIGHLIGHT_SCENARIO),
            max_column_width: 40,
        }
    }
}

impl ChurnReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set currency symbol
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Fix the analysis date instead of using today
    pub fn analysis_date(mut self, date: NaiveDate) -> Self {
        self.analysis_date = Some(date);
        self
    }

    /// Replace the retention scenario percentages
    pub fn retention_scenarios(mut self, percentages: Vec<u32>) -> Self {
        self.retention_scenarios = percentages;
        self
    }

    /// Highlight a different scenario row
    pub fn highlight_scenario(mut self, percentage: u32) -> Self {
        self.highlight_scenario = Some(percentage);
        self
    }

    /// Do not highlight any scenario row
    pub fn no_highlight(mut self) -> Self {
        self.highlight_scenario = None;
        self
    }

    /// Cap auto-sized column widths
    pub fn max_column_width(mut self, width: u16) -> Self {
        self.max_column_width = width;
        self
    }

    /// Build the workbook and serialize it to XLSX bytes
    pub fn render_workbook(&self, table: &RawTable) -> Result<RenderedWorkbook, RenderError> {
        let layout = RawLayout::resolve(table)?;
        tracing::debug!(
            first_row = layout.first_row(),
            last_row = layout.last_row(),
            "resolved raw data layout"
        );

        let formats = self.create_formats();
        let mut workbook = Workbook::new();
        let mut sheets = Vec::with_capacity(7);

        sheets.push(self.add_dashboard_sheet(&mut workbook, &layout, &formats)?);
        for breakdown in [
            &churnbook_core::templates::CONTRACT_BREAKDOWN,
            &churnbook_core::templates::PAYMENT_BREAKDOWN,
        ] {
            sheets.push(self.add_breakdown_sheet(&mut workbook, &layout, &formats, breakdown)?);
        }
        sheets.push(self.add_tenure_sheet(&mut workbook, &layout, &formats)?);
        sheets.push(self.add_service_impact_sheet(&mut workbook, &layout, &formats)?);
        sheets.push(self.add_revenue_sheet(&mut workbook, &layout, &formats)?);
        sheets.push(self.add_raw_data_sheet(&mut workbook, table, &formats)?);

        let bytes = workbook.save_to_buffer().map_err(format_err)?;

        Ok(RenderedWorkbook { bytes, sheets })
    }

    /// Finish a sheet, logging what it contains
    fn finish_sheet(&self, writer: SheetWriter<'_>) -> Result<SheetSummary, RenderError> {
        let name = writer.name().to_string();
        let summary = writer.finish(self.max_column_width)?;
        tracing::info!(sheet = %name, formulas = summary.formulas, "built sheet");
        Ok(summary)
    }

    fn money_format(&self, decimals: bool) -> String {
        let symbol = currency_literal(&self.currency);
        if decimals {
            format!("{symbol}#,##0.00")
        } else {
            format!("{symbol}#,##0")
        }
    }

    /// Create reusable formats
    fn create_formats(&self) -> ReportFormats {
        let title = Format::new()
            .set_bold()
            .set_font_size(16)
            .set_font_color(TITLE_COLOR);

        let dashboard_title = Format::new()
            .set_bold()
            .set_font_size(24)
            .set_font_color(TITLE_COLOR);

        let subtitle = Format::new().set_italic();

        let header = Format::new()
            .set_bold()
            .set_font_size(12)
            .set_font_color(WHITE)
            .set_background_color(HEADER_FILL)
            .set_border(FormatBorder::Thin);

        let kpi_label = Format::new()
            .set_bold()
            .set_font_size(12)
            .set_font_color(WHITE)
            .set_background_color(SUBHEADER_FILL)
            .set_border(FormatBorder::Thin);

        let kpi_value = Format::new()
            .set_bold()
            .set_font_size(14)
            .set_background_color(KPI_FILL)
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        let kpi_percent = kpi_value.clone().set_num_format("0.00%");
        let kpi_money = kpi_value.clone().set_num_format(self.money_format(true));

        let cell = Format::new().set_border(FormatBorder::Thin);
        let percent = cell.clone().set_num_format("0.00%");
        let money = cell.clone().set_num_format(self.money_format(false));

        let total = cell.clone().set_bold();
        let total_percent = percent.clone().set_bold();
        let total_money = money.clone().set_bold();

        let metric_label = cell.clone().set_bold();
        let metric_money = money.clone().set_background_color(KPI_FILL);
        let metric_money_cents = cell
            .clone()
            .set_num_format(self.money_format(true))
            .set_background_color(KPI_FILL);

        let highlight_money = money.clone().set_background_color(HIGHLIGHT_FILL);

        let bold = Format::new().set_bold();
        let insight = Format::new().set_bold().set_font_color(TITLE_COLOR);

        let raw_header = Format::new()
            .set_bold()
            .set_font_size(12)
            .set_font_color(WHITE)
            .set_background_color(HEADER_FILL);

        ReportFormats {
            title,
            dashboard_title,
            subtitle,
            header,
            kpi_label,
            kpi_value,
            kpi_percent,
            kpi_money,
            cell,
            percent,
            money,
            total,
            total_percent,
            total_money,
            metric_label,
            metric_money,
            metric_money_cents,
            highlight_money,
            bold,
            insight,
            raw_header,
        }
    }
}

impl Renderer for ChurnReportRenderer {
    type Output = Vec<u8>;

    fn render(&self, table: &RawTable) -> Result<Vec<u8>, RenderError> {
        self.render_workbook(table).map(|rendered| rendered.bytes)
    }
}

/// A rendered workbook and what each sheet contains
#[derive(Clone, Debug, Serialize)]
pub struct RenderedWorkbook {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub sheets: Vec<SheetSummary>,
}

impl RenderedWorkbook {
    /// Formula cells written across all sheets
    pub fn formula_count(&self) -> usize {
        self.sheets.iter().map(|s| s.formulas).sum()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Write the workbook, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.bytes)?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "saved workbook");
        Ok(())
    }
}

/// Reusable cell formats
pub(crate) struct ReportFormats {
    pub title: Format,
    pub dashboard_title: Format,
    pub subtitle: Format,
    pub header: Format,
    pub kpi_label: Format,
    pub kpi_value: Format,
    pub kpi_percent: Format,
    pub kpi_money: Format,
    pub cell: Format,
    pub percent: Format,
    pub money: Format,
    pub total: Format,
    pub total_percent: Format,
    pub total_money: Format,
    pub metric_label: Format,
    pub metric_money: Format,
    pub metric_money_cents: Format,
    pub highlight_money: Format,
    pub bold: Format,
    pub insight: Format,
    pub raw_header: Format,
}

/// Currency symbol as a number-format literal.
///
/// A quoted section cannot hold `"`, so a symbol containing one is written
/// as backslash-escaped characters instead.
fn currency_literal(currency: &str) -> String {
    if currency.contains('"') {
        currency.chars().map(|c| format!("\\{c}")).collect()
    } else {
        format!("\"{currency}\"")
    }
}

/// Write a header row starting at column A
pub(crate) fn write_headers(
    writer: &mut SheetWriter<'_>,
    row: u32,
    headers: &[&str],
    format: &Format,
) -> Result<(), RenderError> {
    for (col, header) in headers.iter().enumerate() {
        writer.text_with(row, col as u16, header, format)?;
    }
    Ok(())
}
