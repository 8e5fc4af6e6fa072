//! # sheetgraph-xlsx
//!
//! XLSX (Office Open XML) tabular source for sheetgraph.
//!
//! Only cell values are read: every worksheet becomes one sheet whose first
//! non-empty row is the header. Styles, comments and formulas are ignored
//! (formula cells contribute their cached value).

pub mod error;
pub mod options;
pub mod reader;

pub use error::{XlsxError, XlsxResult};
pub use options::XlsxReadOptions;
pub use reader::XlsxReader;
