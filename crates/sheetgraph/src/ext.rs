//! Pipeline methods on [`Workbook`]
//!
//! ```rust
//! use sheetgraph::prelude::*;
//!
//! let mut molecules = Sheet::with_columns("Molecule", ["name"]).unwrap();
//! molecules.push_row(vec!["glc".into()]).unwrap();
//! let mut workbook = Workbook::new();
//! workbook.add_sheet(molecules).unwrap();
//!
//! assert!(workbook.check_types().is_empty());
//! let mapping = GraphMapping::new().with_primary_key("Molecule", "name");
//! assert!(!workbook.validate_mapping(&mapping).unwrap().has_errors());
//!
//! let mut store = MemoryGraphStore::new();
//! let summary = workbook.populate_graph(&mapping, &mut store).unwrap();
//! assert_eq!(summary.nodes_created(), 1);
//! ```

use std::path::Path;

use crate::error::Result;
use crate::mapping::GraphMapping;
use crate::populate::{self, GraphStore, PopulationSummary};
use crate::schema::{self, SheetSchema};
use crate::source::{FileSource, LoadOptions, TabularSource};
use crate::typecheck::{check_workbook, TypeInconsistency};
use crate::validate::{self, GraphValidationResult};
use crate::Workbook;

/// Extension trait for Workbook to run the ETL pipeline
pub trait WorkbookGraphExt {
    /// Load a workbook, CSV file or CSV directory
    fn load<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Load with explicit options
    fn load_with<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Workbook>;

    /// Type inconsistencies of every sheet
    fn check_types(&self) -> Vec<TypeInconsistency>;

    /// The typed schema; fails if any column is inconsistent
    fn build_schema(&self) -> Result<SheetSchema>;

    /// Build the schema and validate a mapping against it
    fn validate_mapping(&self, mapping: &GraphMapping) -> Result<GraphValidationResult>;

    /// Validate, then populate `store`
    fn populate_graph<S: GraphStore + ?Sized>(
        &self,
        mapping: &GraphMapping,
        store: &mut S,
    ) -> Result<PopulationSummary>;
}

impl WorkbookGraphExt for Workbook {
    fn load<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        FileSource::default().load_sheets(path.as_ref())
    }

    fn load_with<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Workbook> {
        FileSource::new(options).load_sheets(path.as_ref())
    }

    fn check_types(&self) -> Vec<TypeInconsistency> {
        check_workbook(self)
    }

    fn build_schema(&self) -> Result<SheetSchema> {
        schema::build_schema(self)
    }

    fn validate_mapping(&self, mapping: &GraphMapping) -> Result<GraphValidationResult> {
        let schema = schema::build_schema(self)?;
        Ok(validate::validate(&schema, mapping, self))
    }

    fn populate_graph<S: GraphStore + ?Sized>(
        &self,
        mapping: &GraphMapping,
        store: &mut S,
    ) -> Result<PopulationSummary> {
        populate::populate(self, mapping, store)
    }
}
