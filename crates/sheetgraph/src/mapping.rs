//! User-declared mapping from sheets to graph nodes and relationships
//!
//! A mapping is a JSON document:
//!
//! ```json
//! {
//!   "sheet_connections": [
//!     {"source_sheet_name": "Reaction", "target_sheet_name": "Measurement",
//!      "edge_name": "measured_by", "key": "well_id"}
//!   ],
//!   "sheet_references": [
//!     {"source_sheet_name": "Reaction", "source_column_name": "substrates",
//!      "target_sheet_name": "Molecule", "target_column_name": "name"}
//!   ],
//!   "primary_keys": {"Molecule": "name"}
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use sheetgraph_core::column::normalize_name;

/// Rows of two sheets sharing a value in `key` are linked by `edge_name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetConnection {
    pub source_sheet_name: String,
    pub target_sheet_name: String,
    pub edge_name: String,
    pub key: String,
}

impl SheetConnection {
    pub fn new(
        source_sheet: impl Into<String>,
        target_sheet: impl Into<String>,
        edge_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            source_sheet_name: source_sheet.into(),
            target_sheet_name: target_sheet.into(),
            edge_name: edge_name.into(),
            key: key.into(),
        }
    }

    /// Relationship type of the edges this connection creates
    pub fn relationship_type(&self) -> String {
        relationship_type(&self.edge_name)
    }
}

/// Comma-separated identifiers in a source column point at rows of a target
/// sheet whose target column holds the same value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetReference {
    pub source_sheet_name: String,
    pub source_column_name: String,
    pub target_sheet_name: String,
    pub target_column_name: String,
}

impl SheetReference {
    pub fn new(
        source_sheet: impl Into<String>,
        source_column: impl Into<String>,
        target_sheet: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            source_sheet_name: source_sheet.into(),
            source_column_name: source_column.into(),
            target_sheet_name: target_sheet.into(),
            target_column_name: target_column.into(),
        }
    }

    /// Relationship type of the edges this reference creates, named after the
    /// source column
    pub fn relationship_type(&self) -> String {
        relationship_type(&self.source_column_name)
    }
}

/// Connections, references and explicit primary keys of one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMapping {
    #[serde(default)]
    pub sheet_connections: Vec<SheetConnection>,
    #[serde(default)]
    pub sheet_references: Vec<SheetReference>,
    /// Explicit primary key column per sheet; overrides every inference
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub primary_keys: BTreeMap<String, String>,
}

impl GraphMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a mapping from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a mapping from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the mapping as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_connection(mut self, connection: SheetConnection) -> Self {
        self.sheet_connections.push(connection);
        self
    }

    pub fn with_reference(mut self, reference: SheetReference) -> Self {
        self.sheet_references.push(reference);
        self
    }

    pub fn with_primary_key(mut self, sheet: impl Into<String>, column: impl Into<String>) -> Self {
        self.primary_keys.insert(sheet.into(), column.into());
        self
    }

    /// Check if the mapping declares nothing
    pub fn is_empty(&self) -> bool {
        self.sheet_connections.is_empty()
            && self.sheet_references.is_empty()
            && self.primary_keys.is_empty()
    }

    /// Copy of the mapping with every column name in canonical form
    ///
    /// Sheets are loaded with normalized column names, so declared names must
    /// be normalized the same way before they are compared.
    pub fn normalized(&self) -> Self {
        Self {
            sheet_connections: self
                .sheet_connections
                .iter()
                .map(|c| SheetConnection {
                    key: normalize_name(&c.key),
                    ..c.clone()
                })
                .collect(),
            sheet_references: self
                .sheet_references
                .iter()
                .map(|r| SheetReference {
                    source_column_name: normalize_name(&r.source_column_name),
                    target_column_name: normalize_name(&r.target_column_name),
                    ..r.clone()
                })
                .collect(),
            primary_keys: self
                .primary_keys
                .iter()
                .map(|(sheet, column)| (sheet.clone(), normalize_name(column)))
                .collect(),
        }
    }
}

/// Turn a declared name into a relationship type
///
/// ```
/// use sheetgraph::mapping::relationship_type;
///
/// assert_eq!(relationship_type("measured by"), "MEASURED_BY");
/// assert_eq!(relationship_type("substrates"), "SUBSTRATES");
/// ```
pub fn relationship_type(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MAPPING: &str = r#"{
        "sheet_connections": [
            {"source_sheet_name": "Reaction", "target_sheet_name": "Measurement",
             "edge_name": "measured by", "key": "well id"}
        ],
        "sheet_references": [
            {"source_sheet_name": "Reaction", "source_column_name": "substrates",
             "target_sheet_name": "Molecule", "target_column_name": "molecule name"}
        ]
    }"#;

    #[test]
    fn test_parse_mapping() {
        let mapping = GraphMapping::from_json(MAPPING).unwrap();
        assert_eq!(mapping.sheet_connections.len(), 1);
        assert_eq!(mapping.sheet_references[0].target_sheet_name, "Molecule");
        assert!(mapping.primary_keys.is_empty());
        assert_eq!(mapping.sheet_connections[0].relationship_type(), "MEASURED_BY");
        assert_eq!(mapping.sheet_references[0].relationship_type(), "SUBSTRATES");
    }

    #[test]
    fn test_missing_arrays_default_to_empty() {
        let mapping = GraphMapping::from_json("{}").unwrap();
        assert!(mapping.is_empty());
        assert!(GraphMapping::from_json("{\"sheet_connections\": 3}").is_err());
    }

    #[test]
    fn test_normalized() {
        let mapping = GraphMapping::from_json(MAPPING)
            .unwrap()
            .with_primary_key("Molecule", "molecule name")
            .normalized();
        assert_eq!(mapping.sheet_connections[0].key, "well_id");
        assert_eq!(mapping.sheet_connections[0].edge_name, "measured by");
        assert_eq!(mapping.sheet_references[0].target_column_name, "molecule_name");
        assert_eq!(mapping.primary_keys["Molecule"], "molecule_name");
    }

    #[test]
    fn test_json_round_trip_omits_empty_primary_keys() {
        let mapping = GraphMapping::new().with_connection(SheetConnection::new("A", "B", "rel", "id"));
        let json = mapping.to_json().unwrap();
        assert!(!json.contains("primary_keys"));
        assert_eq!(GraphMapping::from_json(&json).unwrap(), mapping);
    }

    #[test]
    fn test_relationship_type() {
        assert_eq!(relationship_type(" has-part "), "HAS_PART");
        assert_eq!(relationship_type("KEEP_1"), "KEEP_1");
    }
}
