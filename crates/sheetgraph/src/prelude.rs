//! Prelude module - common imports for sheetgraph users
//!
//! ```rust
//! use sheetgraph::prelude::*;
//! ```

pub use crate::{
    // Pipeline functions
    build_schema,
    check_types,
    load_sheets,
    populate,
    validate,

    CellValue,
    // Error types
    Error,
    GraphMapping,
    // Stores
    CypherStore,
    GraphStore,
    MemoryGraphStore,

    PopulateOptions,
    PopulationSummary,
    Result,
    Sheet,
    SheetConnection,
    SheetReference,
    SheetSchema,
    // Main types
    Workbook,
    // Extension traits
    WorkbookGraphExt,
};
