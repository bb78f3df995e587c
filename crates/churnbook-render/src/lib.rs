//! # churnbook-render
//!
//! Rendering backend for churnbook customer tables.
//!
//! This crate provides:
//! - The formula-driven Excel churn workbook (`ChurnReportRenderer`)
//! - Formula text builders for conditional aggregates (`formula`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use churnbook_loader::load_csv;
//! use churnbook_render::ChurnReportRenderer;
//!
//! let table = load_csv("data/processed/customers_cleaned.csv")?;
//! let rendered = ChurnReportRenderer::new().currency("$").render_workbook(&table)?;
//! rendered.save("excel/churn_analysis_dynamic.xlsx")?;
//! println!("{} formulas", rendered.formula_count());
//! ```

pub mod excel;
pub mod formula;

pub use excel::{ChurnReportRenderer, RenderedWorkbook};
