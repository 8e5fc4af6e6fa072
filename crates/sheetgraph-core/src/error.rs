//! Error types for sheetgraph-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetgraph-core
#[derive(Debug, Error)]
pub enum Error {
    /// Sheet not found by name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Column not found in a sheet
    #[error("Column '{column}' not found in sheet '{sheet}'")]
    ColumnNotFound { sheet: String, column: String },

    /// Two columns of one sheet share a (normalized) name
    #[error("Duplicate column '{column}' in sheet '{sheet}'")]
    DuplicateColumnName { sheet: String, column: String },

    /// A row has more cells than the sheet has columns
    #[error("Row {row} of sheet '{sheet}' has {width} cells but the sheet has {columns} columns")]
    RowTooWide {
        sheet: String,
        row: usize,
        width: usize,
        columns: usize,
    },

    /// A column was supplied with the wrong number of values
    #[error("Column '{column}' of sheet '{sheet}' has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        sheet: String,
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
