//! # sheetgraph-core
//!
//! Core data structures for the sheetgraph tabular-to-graph toolkit.
//!
//! This crate provides the fundamental types used throughout sheetgraph:
//! - [`CellValue`] - Represents cell values (integers, floats, strings, booleans)
//! - [`Sheet`] and [`RowRef`] - A named table and a borrowed view of one of its rows
//! - [`Workbook`] - An ordered set of sheets loaded from one source
//!
//! ## Example
//!
//! ```rust
//! use sheetgraph_core::{CellValue, Sheet, Workbook};
//!
//! let mut sheet = Sheet::with_columns("Molecule", ["name", "weight"]).unwrap();
//! sheet.push_row(vec!["glc".into(), 180.16.into()]).unwrap();
//!
//! let mut workbook = Workbook::new();
//! workbook.add_sheet(sheet).unwrap();
//!
//! let row = workbook.sheet_by_name("Molecule").unwrap().row(0).unwrap();
//! assert_eq!(row.get("name"), &CellValue::from("glc"));
//! assert_eq!(row.spreadsheet_row(), 2);
//! ```

pub mod cell;
pub mod column;
pub mod error;
pub mod row;
pub mod sheet;
pub mod workbook;

// Re-exports for convenience
pub use cell::{clean_text, CellKind, CellValue, SharedString, StringPool};
pub use error::{Error, Result};
pub use row::RowRef;
pub use sheet::Sheet;
pub use workbook::Workbook;
