//! churnbook-verify - formula census of a saved churn workbook

use std::path::PathBuf;

use anyhow::{Context, Result};
use churnbook_cli::{init_tracing, DEFAULT_OUTPUT};
use churnbook_verify::scan_path;
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "churnbook-verify")]
#[command(author, version, about = "Count the formulas in a churn workbook", long_about = None)]
struct Cli {
    /// Workbook to inspect
    #[arg(env = "CHURNBOOK_OUTPUT", default_value = DEFAULT_OUTPUT, value_name = "XLSX")]
    path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(path = %cli.path.display(), format = ?cli.format, "verifying workbook");

    let scan = scan_path(&cli.path)
        .with_context(|| format!("Failed to verify {}", cli.path.display()))?;

    match cli.format {
        OutputFormat::Text => print!("{scan}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&scan).context("Failed to encode report")?;
            println!("{json}");
        }
    }
    Ok(())
}
