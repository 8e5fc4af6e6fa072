//! Graph store contract

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::CellValue;

/// Node properties by name; empty cells are never stored
pub type Properties = BTreeMap<String, CellValue>;

/// Errors raised by a graph store
///
/// Any store error ends the current run; the core never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a node merge did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeOutcome {
    Created,
    Updated,
    /// The mutation was handed to the store, which cannot say which of the
    /// two happened
    Submitted,
}

/// What an edge merge did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EdgeOutcome {
    pub created: usize,
    /// Matching edges that were already present
    pub existing: usize,
    pub submitted: bool,
}

impl EdgeOutcome {
    pub fn submitted() -> Self {
        Self {
            submitted: true,
            ..Self::default()
        }
    }

    /// Neither endpoint pair matched any node
    pub fn is_unmatched(&self) -> bool {
        self.created == 0 && self.existing == 0 && !self.submitted
    }
}

/// Nodes with `label` whose `property` equals `value`
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMatch {
    pub label: String,
    pub property: String,
    pub value: CellValue,
}

impl NodeMatch {
    pub fn new(label: impl Into<String>, property: impl Into<String>, value: CellValue) -> Self {
        Self {
            label: label.into(),
            property: property.into(),
            value,
        }
    }
}

/// A directed relationship between every pair of matched nodes
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMerge {
    pub source: NodeMatch,
    pub target: NodeMatch,
    pub relationship: String,
}

/// A node label and the properties seen on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelDescription {
    pub label: String,
    pub properties: Vec<String>,
}

/// A relationship type and the labels it connects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipDescription {
    pub relationship_type: String,
    pub source_labels: Vec<String>,
    pub target_labels: Vec<String>,
    pub properties: Vec<String>,
}

/// Read-only overview of what a store holds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphDescription {
    pub labels: Vec<LabelDescription>,
    pub relationships: Vec<RelationshipDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_count: Option<usize>,
}

impl GraphDescription {
    pub fn label(&self, label: &str) -> Option<&LabelDescription> {
        self.labels.iter().find(|l| l.label == label)
    }

    pub fn relationship(&self, relationship_type: &str) -> Option<&RelationshipDescription> {
        self.relationships
            .iter()
            .find(|r| r.relationship_type == relationship_type)
    }
}

impl fmt::Display for GraphDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Node labels:")?;
        for label in &self.labels {
            writeln!(f, "  {} {{{}}}", label.label, label.properties.join(", "))?;
        }
        writeln!(f, "Relationship types:")?;
        for rel in &self.relationships {
            writeln!(
                f,
                "  ({})-[:{}]->({})",
                rel.source_labels.join("|"),
                rel.relationship_type,
                rel.target_labels.join("|")
            )?;
        }
        if let (Some(nodes), Some(edges)) = (self.node_count, self.edge_count) {
            write!(f, "{} nodes, {} relationships", nodes, edges)?;
        }
        Ok(())
    }
}

/// Destination of the graph mutations
///
/// Both merges are upserts: repeating one with the same identity must never
/// duplicate a node or an edge.
pub trait GraphStore {
    /// Merge a node by `(label, key_property = key_value)` and add `properties`
    /// to it
    fn merge_node(
        &mut self,
        label: &str,
        key_property: &str,
        key_value: &CellValue,
        properties: &Properties,
    ) -> Result<NodeOutcome, StoreError>;

    /// Merge one relationship per pair of matched source and target nodes
    fn merge_edge(&mut self, edge: &EdgeMerge) -> Result<EdgeOutcome, StoreError>;

    fn describe_schema(&self) -> Result<GraphDescription, StoreError>;
}

impl<S: GraphStore + ?Sized> GraphStore for &mut S {
    fn merge_node(
        &mut self,
        label: &str,
        key_property: &str,
        key_value: &CellValue,
        properties: &Properties,
    ) -> Result<NodeOutcome, StoreError> {
        (**self).merge_node(label, key_property, key_value, properties)
    }

    fn merge_edge(&mut self, edge: &EdgeMerge) -> Result<EdgeOutcome, StoreError> {
        (**self).merge_edge(edge)
    }

    fn describe_schema(&self) -> Result<GraphDescription, StoreError> {
        (**self).describe_schema()
    }
}
