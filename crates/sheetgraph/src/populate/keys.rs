//! Primary key resolution
//!
//! Every sheet needs one key column before its rows can be merged as nodes.
//! Per sheet the first of these wins:
//!
//! 1. the mapping's explicit `primary_keys` entry
//! 2. the `key` of the connections touching the sheet
//! 3. the configured [`PrimaryKeyStrategy`]
//! 4. a synthetic per-row key

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::mapping::GraphMapping;
use crate::{Sheet, Workbook};

/// Fallback used for sheets that have neither an explicit nor a connection key
pub trait PrimaryKeyStrategy: fmt::Debug + Send + Sync {
    /// Pick a key column, or `None` to fall back to a synthetic key
    fn infer(&self, sheet: &Sheet) -> Result<Option<String>>;
}

/// Never infers a key
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInference;

impl PrimaryKeyStrategy for NoInference {
    fn infer(&self, _sheet: &Sheet) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Picks the only upper-case column ending in one of `suffixes`
///
/// Several candidates are an error rather than a silent choice.
#[derive(Debug, Clone)]
pub struct SuffixRule {
    pub suffixes: Vec<String>,
}

impl Default for SuffixRule {
    fn default() -> Self {
        Self {
            suffixes: vec!["_ID".to_string(), "_KEY".to_string()],
        }
    }
}

impl SuffixRule {
    fn is_candidate(&self, column: &str) -> bool {
        let has_cased = column.chars().any(char::is_alphabetic);
        let all_upper = !column.chars().any(char::is_lowercase);
        has_cased && all_upper && self.suffixes.iter().any(|s| column.ends_with(s.as_str()))
    }
}

impl PrimaryKeyStrategy for SuffixRule {
    fn infer(&self, sheet: &Sheet) -> Result<Option<String>> {
        let candidates: Vec<String> = sheet
            .columns()
            .iter()
            .filter(|c| self.is_candidate(c))
            .cloned()
            .collect();
        match candidates.len() {
            0 => Ok(None),
            1 => Ok(candidates.into_iter().next()),
            _ => Err(Error::AmbiguousPrimaryKey {
                sheet: sheet.name().to_string(),
                candidates,
            }),
        }
    }
}

/// Where a sheet's key comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "column", rename_all = "snake_case")]
pub enum KeySource {
    Explicit(String),
    Connection(String),
    Inferred(String),
    Synthetic,
}

/// The resolved key of one sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKey {
    pub sheet: String,
    #[serde(flatten)]
    pub source: KeySource,
}

impl PrimaryKey {
    /// The key column, `None` for a synthetic key
    pub fn column(&self) -> Option<&str> {
        match &self.source {
            KeySource::Explicit(c) | KeySource::Connection(c) | KeySource::Inferred(c) => Some(c),
            KeySource::Synthetic => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == KeySource::Synthetic
    }
}

/// A sheet that connections key on more than one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKeyConflict {
    pub sheet: String,
    /// Distinct keys in declaration order
    pub keys: Vec<String>,
}

impl fmt::Display for PrimaryKeyConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys.iter().map(|k| format!("'{}'", k)).collect();
        write!(
            f,
            "sheet '{}' is connected on keys {}",
            self.sheet,
            keys.join(", ")
        )
    }
}

/// Resolve the key of every sheet of `workbook`, in sheet order
///
/// Fails before anything is returned if any sheet is implied to have two
/// connection keys, listing every such sheet.
pub fn resolve_primary_keys(
    workbook: &Workbook,
    mapping: &GraphMapping,
    strategy: &dyn PrimaryKeyStrategy,
) -> Result<Vec<PrimaryKey>> {
    let mut connection_keys: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for connection in &mapping.sheet_connections {
        for sheet in [&connection.source_sheet_name, &connection.target_sheet_name] {
            let keys = connection_keys.entry(sheet.as_str()).or_default();
            if !keys.contains(&connection.key.as_str()) {
                keys.push(connection.key.as_str());
            }
        }
    }

    let conflicts: Vec<PrimaryKeyConflict> = workbook
        .sheets()
        .filter(|s| !mapping.primary_keys.contains_key(s.name()))
        .filter_map(|s| {
            let keys = connection_keys.get(s.name())?;
            (keys.len() > 1).then(|| PrimaryKeyConflict {
                sheet: s.name().to_string(),
                keys: keys.iter().map(|k| k.to_string()).collect(),
            })
        })
        .collect();
    if !conflicts.is_empty() {
        return Err(Error::PrimaryKeyConflict(conflicts));
    }

    let mut resolved = Vec::with_capacity(workbook.sheet_count());
    for sheet in workbook.sheets() {
        let name = sheet.name();
        let source = if let Some(column) = mapping.primary_keys.get(name) {
            KeySource::Explicit(column.clone())
        } else if let Some(keys) = connection_keys.get(name) {
            KeySource::Connection(keys[0].to_string())
        } else if let Some(column) = strategy.infer(sheet)? {
            KeySource::Inferred(column)
        } else {
            KeySource::Synthetic
        };

        let key = PrimaryKey {
            sheet: name.to_string(),
            source,
        };
        if let Some(column) = key.column() {
            if !sheet.has_column(column) {
                return Err(sheetgraph_core::Error::ColumnNotFound {
                    sheet: name.to_string(),
                    column: column.to_string(),
                }
                .into());
            }
        }
        log::debug!("Primary key of '{}': {:?}", name, key.source);
        resolved.push(key);
    }
    Ok(resolved)
}
