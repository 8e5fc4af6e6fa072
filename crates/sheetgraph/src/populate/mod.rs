//! Materializing sheets as a property graph
//!
//! A run has three phases separated by full barriers:
//!
//! 1. primary key resolution, where every fatal condition is raised
//! 2. node merges, one label per sheet
//! 3. connection edges, then reference edges
//!
//! Every mutation is a merge, so repeating a run against the same store adds
//! nothing.

mod cypher;
mod keys;
mod memory;
mod store;
mod summary;

use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::mapping::{GraphMapping, SheetConnection, SheetReference};
use crate::schema::build_schema;
use crate::validate::{validate, GraphValidationError, GraphValidationResult};
use crate::{CellValue, Sheet, Workbook};

pub use cypher::{quote_identifier, CypherStatement, CypherStore};
pub use keys::{
    resolve_primary_keys, KeySource, NoInference, PrimaryKey, PrimaryKeyConflict,
    PrimaryKeyStrategy, SuffixRule,
};
pub use memory::MemoryGraphStore;
pub use store::{
    EdgeMerge, EdgeOutcome, GraphDescription, GraphStore, LabelDescription, NodeMatch,
    NodeOutcome, Properties, RelationshipDescription, StoreError,
};
pub use summary::{EdgeStats, PopulationSummary, SheetStats};

/// Column added to sheets that end up with a synthetic key
pub const DEFAULT_SYNTHETIC_KEY: &str = "_row_uuid";

/// Shared flag to abort a run between phases and sheets
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Cancelled`] once cancelled
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Options for [`GraphPopulator`]
#[derive(Debug, Clone)]
pub struct PopulateOptions {
    /// Name of the column holding synthetic keys
    pub synthetic_key_column: String,
    /// Fallback for sheets without an explicit or connection key
    pub key_strategy: Arc<dyn PrimaryKeyStrategy>,
    pub cancellation: CancellationToken,
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self {
            synthetic_key_column: DEFAULT_SYNTHETIC_KEY.to_string(),
            key_strategy: Arc::new(NoInference),
            cancellation: CancellationToken::default(),
        }
    }
}

impl PopulateOptions {
    pub fn with_key_strategy<S: PrimaryKeyStrategy + 'static>(mut self, strategy: S) -> Self {
        self.key_strategy = Arc::new(strategy);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

/// A sheet with its resolved key column
struct KeyedSheet<'a> {
    sheet: Cow<'a, Sheet>,
    key: String,
    synthetic: bool,
}

/// Writes one workbook into a [`GraphStore`] according to a mapping
///
/// The mapping is expected to be valid for the workbook; use [`populate`] to
/// validate and populate in one call.
pub struct GraphPopulator<'a> {
    workbook: &'a Workbook,
    mapping: &'a GraphMapping,
    options: PopulateOptions,
}

impl<'a> GraphPopulator<'a> {
    pub fn new(workbook: &'a Workbook, mapping: &'a GraphMapping) -> Self {
        Self {
            workbook,
            mapping,
            options: PopulateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PopulateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PopulateOptions {
        &self.options
    }

    /// Run every phase against `store`
    ///
    /// Nothing is written if a fatal condition is found: conflicting or
    /// ambiguous keys, a sheet or column the mapping names but the workbook
    /// lacks, or cancellation before the first merge.
    pub fn populate<S: GraphStore + ?Sized>(&self, store: &mut S) -> Result<PopulationSummary> {
        let cancel = &self.options.cancellation;
        cancel.check()?;
        self.check_structure()?;

        let keys = resolve_primary_keys(
            self.workbook,
            self.mapping,
            self.options.key_strategy.as_ref(),
        )?;
        let mut sheets = Vec::with_capacity(keys.len());
        for key in &keys {
            let sheet = self.workbook.require_sheet(&key.sheet)?;
            sheets.push(match key.column() {
                Some(column) => KeyedSheet {
                    sheet: Cow::Borrowed(sheet),
                    key: column.to_string(),
                    synthetic: false,
                },
                None => self.with_synthetic_key(sheet)?,
            });
        }
        log::info!(
            "Populating {} sheets, {} connections, {} references",
            sheets.len(),
            self.mapping.sheet_connections.len(),
            self.mapping.sheet_references.len()
        );

        let mut summary = PopulationSummary::default();
        for keyed in &sheets {
            cancel.check()?;
            summary.sheets.push(merge_nodes(store, keyed)?);
        }

        for connection in &self.mapping.sheet_connections {
            cancel.check()?;
            let source = find_keyed(&sheets, &connection.source_sheet_name)?;
            summary
                .connections
                .push(merge_connection(store, source, connection)?);
        }

        for reference in &self.mapping.sheet_references {
            cancel.check()?;
            let source = find_keyed(&sheets, &reference.source_sheet_name)?;
            let target = find_keyed(&sheets, &reference.target_sheet_name)?;
            summary
                .references
                .push(merge_reference(store, source, &target.sheet, reference)?);
        }

        log::info!(
            "Population finished: {} nodes merged, {} edges created",
            summary.nodes_merged(),
            summary.edges_created()
        );
        Ok(summary)
    }

    /// Every sheet and column the mapping names must exist
    fn check_structure(&self) -> Result<()> {
        let require = |sheet: &str, column: &str| -> Result<()> {
            let found = self.workbook.require_sheet(sheet)?;
            if found.has_column(column) {
                Ok(())
            } else {
                Err(sheetgraph_core::Error::ColumnNotFound {
                    sheet: sheet.to_string(),
                    column: column.to_string(),
                }
                .into())
            }
        };
        for c in &self.mapping.sheet_connections {
            if c.relationship_type().is_empty() {
                let mut result = GraphValidationResult::new();
                result.push(GraphValidationError::invalid_relationship(c));
                return Err(Error::Validation(result));
            }
            require(&c.source_sheet_name, &c.key)?;
            require(&c.target_sheet_name, &c.key)?;
        }
        for r in &self.mapping.sheet_references {
            require(&r.source_sheet_name, &r.source_column_name)?;
            require(&r.target_sheet_name, &r.target_column_name)?;
        }
        Ok(())
    }

    /// Working copy of `sheet` with a name-based UUID per row
    fn with_synthetic_key<'s>(&self, sheet: &'s Sheet) -> Result<KeyedSheet<'s>> {
        let column = &self.options.synthetic_key_column;
        log::warn!(
            "Sheet '{}' has no primary key, assigning synthetic '{}'",
            sheet.name(),
            column
        );

        let source = self
            .workbook
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let values = (0..sheet.row_count())
            .map(|index| synthetic_key(&source, sheet.name(), index))
            .collect();

        let mut copy = sheet.clone();
        copy.push_column(column.as_str(), values)?;
        Ok(KeyedSheet {
            sheet: Cow::Owned(copy),
            key: column.clone(),
            synthetic: true,
        })
    }
}

fn synthetic_key(source: &str, sheet: &str, index: usize) -> CellValue {
    let name = format!("sheetgraph:{}#{}/{}", source, sheet, index);
    CellValue::string(Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string())
}

fn find_keyed<'s, 'a>(sheets: &'s [KeyedSheet<'a>], name: &str) -> Result<&'s KeyedSheet<'a>> {
    sheets
        .iter()
        .find(|k| k.sheet.name() == name)
        .ok_or_else(|| sheetgraph_core::Error::SheetNotFound(name.to_string()).into())
}

fn merge_nodes<S: GraphStore + ?Sized>(store: &mut S, keyed: &KeyedSheet<'_>) -> Result<SheetStats> {
    let sheet = &keyed.sheet;
    let mut stats = SheetStats {
        sheet: sheet.name().to_string(),
        primary_key: keyed.key.clone(),
        synthetic_key: keyed.synthetic,
        ..SheetStats::default()
    };

    for row in sheet.rows() {
        let blank = row
            .non_empty()
            .all(|(column, _)| keyed.synthetic && column == keyed.key);
        if blank {
            stats.blank_rows += 1;
            continue;
        }

        let key_value = row.get(&keyed.key);
        if key_value.is_empty() {
            log::debug!(
                "Skipping row {} of '{}': empty primary key '{}'",
                row.spreadsheet_row(),
                stats.sheet,
                keyed.key
            );
            stats.rows_skipped += 1;
            continue;
        }

        let properties: Properties = row
            .non_empty()
            .filter(|(column, _)| *column != keyed.key)
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect();
        let outcome = store.merge_node(&stats.sheet, &keyed.key, key_value, &properties)?;
        stats.record(outcome);
    }

    if stats.rows_skipped > 0 {
        log::warn!(
            "Skipped {} rows of '{}' with an empty primary key",
            stats.rows_skipped,
            stats.sheet
        );
    }
    log::info!("Merged {} nodes for '{}'", stats.nodes_merged(), stats.sheet);
    Ok(stats)
}

fn merge_connection<S: GraphStore + ?Sized>(
    store: &mut S,
    source: &KeyedSheet<'_>,
    connection: &SheetConnection,
) -> Result<EdgeStats> {
    let relationship = connection.relationship_type();
    let mut stats = EdgeStats::new(
        &connection.source_sheet_name,
        &connection.target_sheet_name,
        relationship.clone(),
    );

    for row in source.sheet.rows() {
        let value = row.get(&connection.key);
        if value.is_empty() {
            stats.rows_skipped += 1;
            continue;
        }
        let edge = EdgeMerge {
            source: NodeMatch::new(&connection.source_sheet_name, &connection.key, value.clone()),
            target: NodeMatch::new(&connection.target_sheet_name, &connection.key, value.clone()),
            relationship: relationship.clone(),
        };
        stats.record(store.merge_edge(&edge)?);
    }

    log::info!(
        "Connection {}: {} edges created, {} unmatched",
        relationship,
        stats.edges_created,
        stats.unmatched
    );
    Ok(stats)
}

fn merge_reference<S: GraphStore + ?Sized>(
    store: &mut S,
    source: &KeyedSheet<'_>,
    target: &Sheet,
    reference: &SheetReference,
) -> Result<EdgeStats> {
    let relationship = reference.relationship_type();
    let mut stats = EdgeStats::new(
        &reference.source_sheet_name,
        &reference.target_sheet_name,
        relationship.clone(),
    );

    // token text to the distinct typed values carrying it
    let mut targets: AHashMap<String, Vec<CellValue>> = AHashMap::new();
    for (_, value) in target
        .column_values(&reference.target_column_name)
        .into_iter()
        .flatten()
    {
        if value.is_empty() {
            continue;
        }
        let values = targets.entry(value.to_string()).or_default();
        if !values.contains(value) {
            values.push(value.clone());
        }
    }

    for row in source.sheet.rows() {
        let key_value = row.get(&source.key);
        let cell = row.get(&reference.source_column_name);
        if key_value.is_empty() || cell.is_empty() {
            stats.rows_skipped += 1;
            continue;
        }

        for token in cell.tokens() {
            let Some(values) = targets.get(&token) else {
                log::debug!(
                    "Row {} of '{}': '{}' matches nothing in {}.{}",
                    row.spreadsheet_row(),
                    reference.source_sheet_name,
                    token,
                    reference.target_sheet_name,
                    reference.target_column_name
                );
                stats.unmatched += 1;
                continue;
            };
            for value in values {
                let edge = EdgeMerge {
                    source: NodeMatch::new(&reference.source_sheet_name, &source.key, key_value.clone()),
                    target: NodeMatch::new(
                        &reference.target_sheet_name,
                        &reference.target_column_name,
                        value.clone(),
                    ),
                    relationship: relationship.clone(),
                };
                stats.record(store.merge_edge(&edge)?);
            }
        }
    }

    log::info!(
        "Reference {}: {} edges created, {} unmatched",
        relationship,
        stats.edges_created,
        stats.unmatched
    );
    Ok(stats)
}

/// Build the schema, validate `mapping` and populate `store` with default
/// options
///
/// Type inconsistencies and validation errors are returned as errors before
/// any mutation.
pub fn populate<S: GraphStore + ?Sized>(
    workbook: &Workbook,
    mapping: &GraphMapping,
    store: &mut S,
) -> Result<PopulationSummary> {
    populate_with(workbook, mapping, store, PopulateOptions::default())
}

/// [`populate`] with explicit options
pub fn populate_with<S: GraphStore + ?Sized>(
    workbook: &Workbook,
    mapping: &GraphMapping,
    store: &mut S,
    options: PopulateOptions,
) -> Result<PopulationSummary> {
    let schema = build_schema(workbook)?;
    let result = validate(&schema, mapping, workbook);
    if result.has_errors() {
        return Err(Error::Validation(result));
    }
    GraphPopulator::new(workbook, mapping)
        .with_options(options)
        .populate(store)
}
