//! Errors raised while loading sheets from a workbook package

use thiserror::Error;

/// Result alias for workbook loading
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Why a workbook could not be turned into sheets
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("failed to read workbook: {0}")]
    Io(#[from] std::io::Error),

    /// The package is not a readable zip archive
    #[error("workbook package is not a valid archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A package part is not well-formed XML
    #[error("malformed workbook XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The archive is not a spreadsheet package (no `[Content_Types].xml`)
    #[error("not a spreadsheet package: {0}")]
    InvalidFormat(String),

    /// A part the workbook refers to is absent from the archive
    #[error("workbook part '{0}' is missing")]
    MissingPart(String),

    /// A cell, row or shared string reference cannot be resolved
    #[error("unreadable worksheet content: {0}")]
    Parse(String),

    /// The loaded cells do not form a valid sheet (duplicate names, ragged rows)
    #[error(transparent)]
    Core(#[from] sheetgraph_core::Error),
}
