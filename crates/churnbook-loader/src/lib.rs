//! # churnbook-loader
//!
//! Loads the customer CSV into a [`RawTable`].
//!
//! The first row is the header. Every field is typed per cell with
//! [`RawValue::infer`]: numbers stay numbers so that `SUM` and `COUNTIFS`
//! comparisons work on the raw data sheet, and the Yes/No flags stay text.
//!
//! ```rust
//! use churnbook_loader::CsvLoader;
//!
//! let csv = "customerID,tenure,Churn\n0001-A,5,Yes\n0002-B,40,No\n";
//! let table = CsvLoader::new().read(csv.as_bytes()).unwrap();
//! assert_eq!(table.len(), 2);
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use churnbook_core::{RawTable, RawValue};
use thiserror::Error;

/// Result type for load operations
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while loading the customer table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input has no header row")]
    MissingHeader,
}

/// CSV reader options
#[derive(Clone, Debug)]
pub struct CsvLoader {
    /// Field delimiter
    pub delimiter: u8,
    /// Accept records with a different field count than the header
    pub flexible: bool,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            delimiter: b',',
            flexible: false,
        }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Allow ragged rows; short rows are padded with empty cells
    pub fn flexible(mut self) -> Self {
        self.flexible = true;
        self
    }

    /// Read a CSV file into a table
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> LoadResult<RawTable> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening customer table");
        let file = File::open(path)?;
        self.read(file)
    }

    /// Read CSV from any reader into a table
    pub fn read<R: Read>(&self, reader: R) -> LoadResult<RawTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(self.flexible)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(String::is_empty) {
            return Err(LoadError::MissingHeader);
        }

        let mut table = RawTable::new(headers);
        for result in csv_reader.records() {
            let record = result?;
            table.push_row(record.iter().map(RawValue::infer).collect());
        }

        tracing::info!(
            records = table.len(),
            columns = table.headers().len(),
            "loaded customer table"
        );
        Ok(table)
    }
}

/// Load a customer CSV with default options
pub fn load_csv<P: AsRef<Path>>(path: P) -> LoadResult<RawTable> {
    CsvLoader::new().read_file(path)
}
