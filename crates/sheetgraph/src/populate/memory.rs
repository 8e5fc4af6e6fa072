//! In-memory property graph with merge semantics

use std::collections::{BTreeMap, BTreeSet};

use ahash::{AHashMap, AHashSet};

use super::store::{
    EdgeMerge, EdgeOutcome, GraphDescription, GraphStore, LabelDescription, NodeMatch,
    NodeOutcome, Properties, RelationshipDescription, StoreError,
};
use crate::{CellValue, SharedString};

/// Hashable identity of a property value
///
/// Whole floats compare equal to integers, like numbers in a Cypher `MATCH`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ValueKey {
    Boolean(bool),
    Integer(i64),
    Float(u64),
    Text(SharedString),
}

impl ValueKey {
    fn of(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Empty => None,
            CellValue::Boolean(b) => Some(ValueKey::Boolean(*b)),
            CellValue::Integer(n) => Some(ValueKey::Integer(*n)),
            CellValue::Float(n) => {
                if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 {
                    Some(ValueKey::Integer(*n as i64))
                } else {
                    Some(ValueKey::Float(n.to_bits()))
                }
            }
            CellValue::String(s) => Some(ValueKey::Text(s.clone())),
        }
    }
}

type PropertyKey = (String, String, ValueKey);

#[derive(Debug, Clone)]
struct Node {
    label: String,
    properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Edge {
    source: usize,
    relationship: String,
    target: usize,
}

/// Property graph held in memory
///
/// Nodes are merged by `(label, key property, key value)` and edges by
/// `(source, relationship type, target)`, so repeating a load changes nothing.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    nodes: Vec<Node>,
    /// `(label, property, value)` to every node holding it
    by_property: AHashMap<PropertyKey, Vec<usize>>,
    merge_index: AHashMap<PropertyKey, usize>,
    edges: Vec<Edge>,
    edge_index: AHashSet<Edge>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of nodes with a label
    pub fn label_count(&self, label: &str) -> usize {
        self.nodes.iter().filter(|n| n.label == label).count()
    }

    /// Number of edges of a relationship type
    pub fn relationship_count(&self, relationship: &str) -> usize {
        self.edges
            .iter()
            .filter(|e| e.relationship == relationship)
            .count()
    }

    /// Properties of the first node matching `(label, property = value)`
    pub fn find_node(&self, label: &str, property: &str, value: &CellValue) -> Option<&Properties> {
        self.matching(&NodeMatch::new(label, property, value.clone()))
            .first()
            .map(|&i| &self.nodes[i].properties)
    }

    /// Check if any edge of `relationship` links the two matches
    pub fn has_edge(&self, source: &NodeMatch, relationship: &str, target: &NodeMatch) -> bool {
        let targets = self.matching(target);
        self.matching(source).into_iter().any(|s| {
            targets.iter().any(|&t| {
                self.edge_index.contains(&Edge {
                    source: s,
                    relationship: relationship.to_string(),
                    target: t,
                })
            })
        })
    }

    /// Properties of the targets reached from `source` over `relationship`
    pub fn neighbors(&self, source: &NodeMatch, relationship: &str) -> Vec<&Properties> {
        let sources = self.matching(source);
        self.edges
            .iter()
            .filter(|e| e.relationship == relationship && sources.contains(&e.source))
            .map(|e| &self.nodes[e.target].properties)
            .collect()
    }

    fn matching(&self, node: &NodeMatch) -> Vec<usize> {
        ValueKey::of(&node.value)
            .and_then(|value| {
                self.by_property
                    .get(&(node.label.clone(), node.property.clone(), value))
            })
            .cloned()
            .unwrap_or_default()
    }

    fn index_property(&mut self, node: usize, property: &str, old: Option<&CellValue>, new: &CellValue) {
        let label = self.nodes[node].label.clone();
        if let Some(old) = old.and_then(ValueKey::of) {
            let key = (label.clone(), property.to_string(), old);
            if let Some(ids) = self.by_property.get_mut(&key) {
                ids.retain(|&i| i != node);
            }
        }
        if let Some(new) = ValueKey::of(new) {
            self.by_property
                .entry((label, property.to_string(), new))
                .or_default()
                .push(node);
        }
    }

    fn set_property(&mut self, node: usize, property: &str, value: &CellValue) {
        let old = self.nodes[node].properties.get(property).cloned();
        if old.as_ref() == Some(value) {
            return;
        }
        self.index_property(node, property, old.as_ref(), value);
        self.nodes[node]
            .properties
            .insert(property.to_string(), value.clone());
    }
}

impl GraphStore for MemoryGraphStore {
    fn merge_node(
        &mut self,
        label: &str,
        key_property: &str,
        key_value: &CellValue,
        properties: &Properties,
    ) -> Result<NodeOutcome, StoreError> {
        let key = ValueKey::of(key_value).ok_or_else(|| {
            StoreError::Query(format!(
                "cannot merge :{} on an empty '{}'",
                label, key_property
            ))
        })?;
        let merge_key = (label.to_string(), key_property.to_string(), key);

        let existing = self.merge_index.get(&merge_key).copied();
        let (node, outcome) = match existing {
            Some(node) => (node, NodeOutcome::Updated),
            None => {
                let node = self.nodes.len();
                self.nodes.push(Node {
                    label: label.to_string(),
                    properties: Properties::new(),
                });
                self.merge_index.insert(merge_key, node);
                self.set_property(node, key_property, key_value);
                (node, NodeOutcome::Created)
            }
        };

        for (name, value) in properties {
            if !value.is_empty() {
                self.set_property(node, name, value);
            }
        }
        Ok(outcome)
    }

    fn merge_edge(&mut self, edge: &EdgeMerge) -> Result<EdgeOutcome, StoreError> {
        let sources = self.matching(&edge.source);
        let targets = self.matching(&edge.target);

        let mut outcome = EdgeOutcome::default();
        for &source in &sources {
            for &target in &targets {
                let candidate = Edge {
                    source,
                    relationship: edge.relationship.clone(),
                    target,
                };
                if self.edge_index.contains(&candidate) {
                    outcome.existing += 1;
                } else {
                    self.edge_index.insert(candidate.clone());
                    self.edges.push(candidate);
                    outcome.created += 1;
                }
            }
        }
        Ok(outcome)
    }

    fn describe_schema(&self) -> Result<GraphDescription, StoreError> {
        let mut labels: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for node in &self.nodes {
            labels
                .entry(node.label.as_str())
                .or_default()
                .extend(node.properties.keys().map(String::as_str));
        }

        let mut relationships: BTreeMap<&str, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();
        for edge in &self.edges {
            let (sources, targets) = relationships.entry(edge.relationship.as_str()).or_default();
            sources.insert(self.nodes[edge.source].label.as_str());
            targets.insert(self.nodes[edge.target].label.as_str());
        }

        Ok(GraphDescription {
            labels: labels
                .into_iter()
                .map(|(label, properties)| LabelDescription {
                    label: label.to_string(),
                    properties: properties.into_iter().map(str::to_string).collect(),
                })
                .collect(),
            relationships: relationships
                .into_iter()
                .map(|(rel, (sources, targets))| RelationshipDescription {
                    relationship_type: rel.to_string(),
                    source_labels: sources.into_iter().map(str::to_string).collect(),
                    target_labels: targets.into_iter().map(str::to_string).collect(),
                    properties: Vec::new(),
                })
                .collect(),
            node_count: Some(self.nodes.len()),
            edge_count: Some(self.edges.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn props(pairs: &[(&str, CellValue)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_merge_node_is_upsert() {
        let mut store = MemoryGraphStore::new();
        let key = CellValue::from("glc");
        let outcome = store
            .merge_node("Molecule", "name", &key, &props(&[("mass", 180.0.into())]))
            .unwrap();
        assert_eq!(outcome, NodeOutcome::Created);

        let outcome = store
            .merge_node("Molecule", "name", &key, &props(&[("mass", 180.16.into())]))
            .unwrap();
        assert_eq!(outcome, NodeOutcome::Updated);
        assert_eq!(store.node_count(), 1);

        let node = store.find_node("Molecule", "mass", &180.16.into()).unwrap();
        assert_eq!(node["name"], key);
        assert!(store.find_node("Molecule", "mass", &180.0.into()).is_none());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let mut store = MemoryGraphStore::new();
        let result = store.merge_node("Molecule", "name", &CellValue::Empty, &Properties::new());
        assert!(matches!(result, Err(StoreError::Query(_))));
    }

    #[test]
    fn test_merge_edge_matches_every_pair() {
        let mut store = MemoryGraphStore::new();
        for (name, kind) in [("glc", "sugar"), ("fru", "sugar"), ("eth", "alcohol")] {
            store
                .merge_node("Molecule", "name", &name.into(), &props(&[("kind", kind.into())]))
                .unwrap();
        }
        store
            .merge_node("Reaction", "well_id", &"A1".into(), &Properties::new())
            .unwrap();

        let edge = EdgeMerge {
            source: NodeMatch::new("Reaction", "well_id", "A1".into()),
            target: NodeMatch::new("Molecule", "kind", "sugar".into()),
            relationship: "USES".into(),
        };
        let first = store.merge_edge(&edge).unwrap();
        assert_eq!((first.created, first.existing), (2, 0));
        let second = store.merge_edge(&edge).unwrap();
        assert_eq!((second.created, second.existing), (0, 2));
        assert_eq!(store.edge_count(), 2);

        let missing = EdgeMerge {
            target: NodeMatch::new("Molecule", "kind", "salt".into()),
            ..edge
        };
        assert!(store.merge_edge(&missing).unwrap().is_unmatched());
    }

    #[test]
    fn test_numeric_keys_unify() {
        let mut store = MemoryGraphStore::new();
        store
            .merge_node("Well", "number", &CellValue::Integer(3), &Properties::new())
            .unwrap();
        store
            .merge_node("Well", "number", &CellValue::Float(3.0), &Properties::new())
            .unwrap();
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn test_describe_schema() {
        let mut store = MemoryGraphStore::new();
        store
            .merge_node("Reaction", "well_id", &"A1".into(), &props(&[("volume", 3.into())]))
            .unwrap();
        store
            .merge_node("Molecule", "name", &"glc".into(), &Properties::new())
            .unwrap();
        store
            .merge_edge(&EdgeMerge {
                source: NodeMatch::new("Reaction", "well_id", "A1".into()),
                target: NodeMatch::new("Molecule", "name", "glc".into()),
                relationship: "SUBSTRATES".into(),
            })
            .unwrap();

        let description = store.describe_schema().unwrap();
        assert_eq!(
            description.label("Reaction").unwrap().properties,
            vec!["volume", "well_id"]
        );
        let rel = description.relationship("SUBSTRATES").unwrap();
        assert_eq!(rel.source_labels, vec!["Reaction"]);
        assert_eq!(rel.target_labels, vec!["Molecule"]);
        assert_eq!(description.node_count, Some(2));
        assert!(description.to_string().contains("(Reaction)-[:SUBSTRATES]->(Molecule)"));
    }
}
