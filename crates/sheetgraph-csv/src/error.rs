//! Errors raised while loading sheets from CSV files

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for CSV loading
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Why a CSV file or directory could not be turned into sheets
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to read CSV input: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be decoded (bad quoting, invalid UTF-8)
    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv::Error),

    /// The file name has no usable stem
    #[error("cannot derive a sheet name from {0}")]
    SheetName(PathBuf),

    #[error("no CSV files found in {0}")]
    EmptyDirectory(PathBuf),

    /// The records do not form a valid sheet (duplicate sheet names across files)
    #[error(transparent)]
    Core(#[from] sheetgraph_core::Error),
}
