//! Shared pieces of the `churnbook` and `churnbook-verify` binaries:
//! default paths, tracing setup and the stdout report text.

use std::path::Path;

use churnbook_core::templates::sheets;
use churnbook_render::RenderedWorkbook;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_INPUT: &str = "data/processed/customers_cleaned.csv";
pub const DEFAULT_OUTPUT: &str = "excel/churn_analysis_dynamic.xlsx";

const RULE_WIDTH: usize = 70;

/// Formula families listed after a successful build
pub const FORMULA_FAMILIES: [&str; 5] = [
    "COUNTIF / COUNTIFS (segmentation)",
    "SUMIF / SUMIFS (revenue calculations)",
    "AVERAGEIF (average by segment)",
    "Percentage calculations",
    "Scenario projections",
];

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins; otherwise `-v` enables debug and `-vv` trace.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Title between two rules
pub fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("{rule}\n{title}\n{rule}\n")
}

/// 7043 -> "7,043"
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Progress label for a built sheet
pub fn sheet_label(name: &str) -> &str {
    match name {
        sheets::DASHBOARD => "Dashboard (KPI formulas)",
        sheets::CHURN_BY_CONTRACT => "Churn by Contract (COUNTIFS, SUMIFS)",
        sheets::CHURN_BY_PAYMENT => "Churn by Payment (COUNTIFS, SUMIFS)",
        sheets::CHURN_BY_TENURE => "Churn by Tenure (range formulas)",
        sheets::SERVICE_IMPACT => "Service Impact (cross-analysis)",
        sheets::REVENUE_ANALYSIS => "Revenue Analysis (scenarios)",
        sheets::RAW_DATA => "Raw Data",
        other => other,
    }
}

/// One `   -> <label>` line per sheet, in build order
pub fn sheet_progress(rendered: &RenderedWorkbook) -> Vec<String> {
    rendered
        .sheets
        .iter()
        .map(|s| format!("   -> {}", sheet_label(&s.name)))
        .collect()
}

/// Closing block printed once the workbook is on disk
pub fn success_summary(path: &Path, rendered: &RenderedWorkbook) -> String {
    let mut out = String::from("\n");
    out.push_str(&banner("SUCCESS!"));
    out.push_str(&format!("File: {}\n", path.display()));
    out.push_str(&format!("Sheets: {}\n", rendered.sheet_names().join(", ")));
    out.push_str(&format!("Total Dynamic Formulas: {}\n", rendered.formula_count()));
    out.push_str("\nFormula Types Used:\n");
    for family in FORMULA_FAMILIES {
        out.push_str(&format!("   - {family}\n"));
    }
    out
}
