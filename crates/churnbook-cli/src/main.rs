//! churnbook - customer churn workbook builder
//!
//! Loads the cleaned customer CSV and writes a workbook whose figures are
//! all live spreadsheet formulas over the raw data.

use std::path::PathBuf;

use anyhow::{Context, Result};
use churnbook_cli::{
    banner, init_tracing, sheet_progress, success_summary, thousands, DEFAULT_INPUT,
    DEFAULT_OUTPUT,
};
use churnbook_loader::load_csv;
use churnbook_render::ChurnReportRenderer;
use clap::Parser;

#[derive(Parser)]
#[command(name = "churnbook")]
#[command(author, version, about = "Build the formula-driven customer churn workbook", long_about = None)]
struct Cli {
    /// Cleaned customer CSV
    #[arg(short, long, env = "CHURNBOOK_INPUT", default_value = DEFAULT_INPUT, value_name = "CSV")]
    input: PathBuf,

    /// Workbook to write (parent directories are created)
    #[arg(short, long, env = "CHURNBOOK_OUTPUT", default_value = DEFAULT_OUTPUT, value_name = "XLSX")]
    output: PathBuf,

    /// Currency symbol for money formats
    #[arg(long, env = "CHURNBOOK_CURRENCY", default_value = "$")]
    currency: String,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(input = %cli.input.display(), output = %cli.output.display(), "building workbook");

    print!("{}", banner("CUSTOMER CHURN - ENHANCED EXCEL WORKBOOK GENERATOR"));

    println!("\nLoading data...");
    let table = load_csv(&cli.input)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    println!("   Loaded {} records", thousands(table.len()));

    println!("\nCreating Excel workbook with DYNAMIC formulas...");
    let rendered = ChurnReportRenderer::new()
        .currency(&cli.currency)
        .render_workbook(&table)
        .context("Failed to build workbook")?;
    for line in sheet_progress(&rendered) {
        println!("{line}");
    }

    println!("\nSaving to: {}", cli.output.display());
    rendered
        .save(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    print!("{}", success_summary(&cli.output, &rendered));
    Ok(())
}
