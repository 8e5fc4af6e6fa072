//! # sheetgraph
//!
//! Load spreadsheet data into a property graph.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! - [`typecheck`] infers a type per column and reports every column that
//!   mixes incompatible values, with spreadsheet row numbers
//! - [`schema`] and [`validate`] build a typed [`SheetSchema`] and check a
//!   [`GraphMapping`] against it, down to the values of reference columns
//! - [`populate`] merges one node per row and the declared relationships into
//!   a [`GraphStore`]
//!
//! Sheets come from XLSX workbooks, CSV files or directories of CSV files
//! through [`TabularSource`].
//!
//! ## Example
//!
//! ```rust
//! use sheetgraph::prelude::*;
//!
//! let mut reaction = Sheet::with_columns("Reaction", ["well_id", "substrates"]).unwrap();
//! reaction.push_row(vec!["A1".into(), "glc, eth".into()]).unwrap();
//! let mut molecule = Sheet::with_columns("Molecule", ["name"]).unwrap();
//! for name in ["glc", "eth", "prod1"] {
//!     molecule.push_row(vec![name.into()]).unwrap();
//! }
//! let mut workbook = Workbook::new();
//! workbook.add_sheet(reaction).unwrap();
//! workbook.add_sheet(molecule).unwrap();
//!
//! let mapping = GraphMapping::new()
//!     .with_reference(SheetReference::new("Reaction", "substrates", "Molecule", "name"))
//!     .with_primary_key("Reaction", "well_id")
//!     .with_primary_key("Molecule", "name");
//!
//! let mut store = MemoryGraphStore::new();
//! let summary = populate(&workbook, &mapping, &mut store).unwrap();
//! assert_eq!(summary.nodes_created(), 4);
//! assert_eq!(store.relationship_count("SUBSTRATES"), 2);
//! ```

pub mod error;
pub mod ext;
pub mod mapping;
pub mod populate;
pub mod prelude;
pub mod schema;
pub mod source;
pub mod typecheck;
pub mod validate;

pub use error::{Error, Result};
pub use ext::WorkbookGraphExt;
pub use mapping::{GraphMapping, SheetConnection, SheetReference};
pub use populate::{
    populate, populate_with, CancellationToken, CypherStore, GraphPopulator, GraphStore,
    MemoryGraphStore, PopulateOptions, PopulationSummary,
};
pub use schema::{build_schema, ColumnSchema, DataType, SheetSchema, SheetShape};
pub use source::{load_sheets, FileSource, LoadOptions, TabularSource};
pub use typecheck::{check_types, check_workbook, TypeChecker, TypeInconsistency};
pub use validate::{validate, GraphValidationError, GraphValidationResult, ValidationErrorKind};

// Re-export core types
pub use sheetgraph_core::{CellKind, CellValue, RowRef, SharedString, Sheet, Workbook};
