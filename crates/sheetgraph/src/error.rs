//! Error types for sheetgraph

use std::path::PathBuf;

use thiserror::Error;

use crate::populate::{PrimaryKeyConflict, StoreError};
use crate::typecheck::TypeInconsistencyReport;
use crate::validate::GraphValidationResult;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, validating or populating
#[derive(Debug, Error)]
pub enum Error {
    /// Data model error
    #[error(transparent)]
    Core(#[from] sheetgraph_core::Error),

    /// CSV source error
    #[error(transparent)]
    Csv(#[from] sheetgraph_csv::CsvError),

    /// XLSX source error
    #[error(transparent)]
    Xlsx(#[from] sheetgraph_xlsx::XlsxError),

    /// The input is neither a workbook, a CSV file nor a directory
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// One or more columns mix incompatible value types
    #[error("Type inconsistencies found:\n{0}")]
    TypeInconsistency(TypeInconsistencyReport),

    /// The mapping does not match the sheets
    #[error("Graph mapping validation failed:{0}")]
    Validation(GraphValidationResult),

    /// Connections imply different primary keys for the same sheet
    #[error("Conflicting primary keys: {}", format_conflicts(.0))]
    PrimaryKeyConflict(Vec<PrimaryKeyConflict>),

    /// The key inference strategy found several candidate columns
    #[error("Sheet '{sheet}' has multiple candidate primary key columns {candidates:?}. Keep zero or exactly one.")]
    AmbiguousPrimaryKey {
        sheet: String,
        candidates: Vec<String>,
    },

    /// The graph store rejected a mutation
    #[error("Graph store error: {0}")]
    Store(#[from] StoreError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled before completion
    #[error("Operation cancelled")]
    Cancelled,

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

fn format_conflicts(conflicts: &[PrimaryKeyConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
