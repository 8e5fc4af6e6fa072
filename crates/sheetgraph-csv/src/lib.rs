//! # sheetgraph-csv
//!
//! CSV tabular source for sheetgraph. One file becomes one sheet named after
//! the file stem; a directory of CSV files becomes one workbook.

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
