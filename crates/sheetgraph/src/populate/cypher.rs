//! Graph store that renders every mutation as a parameterized Cypher statement
//!
//! Statements are collected in order and can be written out as JSON lines,
//! one `{"query": ..., "parameters": {...}}` object per line, for any driver
//! that speaks Cypher.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::store::{
    EdgeMerge, EdgeOutcome, GraphDescription, GraphStore, LabelDescription, NodeOutcome,
    Properties, RelationshipDescription, StoreError,
};
use crate::CellValue;

/// One Cypher query with its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CypherStatement {
    pub query: String,
    pub parameters: Map<String, Value>,
}

/// Collects Cypher statements instead of executing them
#[derive(Debug, Default)]
pub struct CypherStore {
    statements: Vec<CypherStatement>,
    labels: BTreeMap<String, BTreeSet<String>>,
    relationships: BTreeMap<String, (BTreeSet<String>, BTreeSet<String>)>,
}

impl CypherStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[CypherStatement] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<CypherStatement> {
        self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Write every statement as one JSON object per line
    pub fn write_json_lines<W: Write>(&self, mut writer: W) -> Result<(), StoreError> {
        for statement in &self.statements {
            serde_json::to_writer(&mut writer, statement).map_err(std::io::Error::from)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl GraphStore for CypherStore {
    fn merge_node(
        &mut self,
        label: &str,
        key_property: &str,
        key_value: &CellValue,
        properties: &Properties,
    ) -> Result<NodeOutcome, StoreError> {
        if key_value.is_empty() {
            return Err(StoreError::Query(format!(
                "cannot merge :{} on an empty '{}'",
                label, key_property
            )));
        }

        let query = format!(
            "MERGE (n:{} {{{}: $key}}) SET n += $props",
            quote_identifier(label),
            quote_identifier(key_property)
        );
        let props: Map<String, Value> = properties
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), json_value(v)))
            .collect();

        let seen = self.labels.entry(label.to_string()).or_default();
        seen.insert(key_property.to_string());
        seen.extend(props.keys().cloned());

        let mut parameters = Map::new();
        parameters.insert("key".to_string(), json_value(key_value));
        parameters.insert("props".to_string(), Value::Object(props));
        log::debug!("{}", query);
        self.statements.push(CypherStatement { query, parameters });
        Ok(NodeOutcome::Submitted)
    }

    fn merge_edge(&mut self, edge: &EdgeMerge) -> Result<EdgeOutcome, StoreError> {
        let query = format!(
            "MATCH (s:{} {{{}: $source}}), (t:{} {{{}: $target}}) MERGE (s)-[:{}]->(t)",
            quote_identifier(&edge.source.label),
            quote_identifier(&edge.source.property),
            quote_identifier(&edge.target.label),
            quote_identifier(&edge.target.property),
            quote_identifier(&edge.relationship)
        );

        let (sources, targets) = self
            .relationships
            .entry(edge.relationship.clone())
            .or_default();
        sources.insert(edge.source.label.clone());
        targets.insert(edge.target.label.clone());

        let mut parameters = Map::new();
        parameters.insert("source".to_string(), json_value(&edge.source.value));
        parameters.insert("target".to_string(), json_value(&edge.target.value));
        log::debug!("{}", query);
        self.statements.push(CypherStatement { query, parameters });
        Ok(EdgeOutcome::submitted())
    }

    fn describe_schema(&self) -> Result<GraphDescription, StoreError> {
        Ok(GraphDescription {
            labels: self
                .labels
                .iter()
                .map(|(label, properties)| LabelDescription {
                    label: label.clone(),
                    properties: properties.iter().cloned().collect(),
                })
                .collect(),
            relationships: self
                .relationships
                .iter()
                .map(|(rel, (sources, targets))| RelationshipDescription {
                    relationship_type: rel.clone(),
                    source_labels: sources.iter().cloned().collect(),
                    target_labels: targets.iter().cloned().collect(),
                    properties: Vec::new(),
                })
                .collect(),
            node_count: None,
            edge_count: None,
        })
    }
}

/// Back-tick quote a label, property or relationship type
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// JSON has no NaN or infinity, so those floats travel as their text
fn json_value(value: &CellValue) -> Value {
    match value {
        CellValue::Empty => Value::Null,
        CellValue::Boolean(b) => Value::Bool(*b),
        CellValue::Integer(n) => Value::Number((*n).into()),
        CellValue::Float(n) => match Number::from_f64(*n) {
            Some(number) => Value::Number(number),
            None => Value::String(n.to_string()),
        },
        CellValue::String(s) => Value::String(s.as_str().to_string()),
    }
}
