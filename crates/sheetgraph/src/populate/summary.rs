//! Counts reported by a population run

use std::fmt;

use serde::Serialize;

use super::store::{EdgeOutcome, NodeOutcome};

/// Node statistics of one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SheetStats {
    pub sheet: String,
    pub primary_key: String,
    pub synthetic_key: bool,
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub nodes_submitted: usize,
    /// Rows whose primary key cell is empty
    pub rows_skipped: usize,
    /// Rows without any value
    pub blank_rows: usize,
}

impl SheetStats {
    pub(crate) fn record(&mut self, outcome: NodeOutcome) {
        match outcome {
            NodeOutcome::Created => self.nodes_created += 1,
            NodeOutcome::Updated => self.nodes_updated += 1,
            NodeOutcome::Submitted => self.nodes_submitted += 1,
        }
    }

    /// Nodes written, whatever the outcome
    pub fn nodes_merged(&self) -> usize {
        self.nodes_created + self.nodes_updated + self.nodes_submitted
    }
}

/// Edge statistics of one connection or reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeStats {
    pub source_sheet: String,
    pub target_sheet: String,
    pub relationship_type: String,
    pub edges_created: usize,
    pub edges_existing: usize,
    /// Merges handed to a store that does not report matches
    pub edges_submitted: usize,
    /// Merges or reference tokens that matched no node
    pub unmatched: usize,
    /// Rows with an empty key or reference cell
    pub rows_skipped: usize,
}

impl EdgeStats {
    pub(crate) fn new(source: &str, target: &str, relationship_type: String) -> Self {
        Self {
            source_sheet: source.to_string(),
            target_sheet: target.to_string(),
            relationship_type,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: EdgeOutcome) {
        self.edges_created += outcome.created;
        self.edges_existing += outcome.existing;
        if outcome.submitted {
            self.edges_submitted += 1;
        }
        if outcome.is_unmatched() {
            self.unmatched += 1;
        }
    }
}

/// Result of [`GraphPopulator::populate`](super::GraphPopulator::populate)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationSummary {
    pub sheets: Vec<SheetStats>,
    pub connections: Vec<EdgeStats>,
    pub references: Vec<EdgeStats>,
}

impl PopulationSummary {
    pub fn sheet(&self, name: &str) -> Option<&SheetStats> {
        self.sheets.iter().find(|s| s.sheet == name)
    }

    pub fn nodes_created(&self) -> usize {
        self.sheets.iter().map(|s| s.nodes_created).sum()
    }

    pub fn nodes_merged(&self) -> usize {
        self.sheets.iter().map(SheetStats::nodes_merged).sum()
    }

    pub fn edges_created(&self) -> usize {
        self.edges().map(|e| e.edges_created).sum()
    }

    pub fn edges_existing(&self) -> usize {
        self.edges().map(|e| e.edges_existing).sum()
    }

    pub fn edges_submitted(&self) -> usize {
        self.edges().map(|e| e.edges_submitted).sum()
    }

    pub fn unmatched(&self) -> usize {
        self.edges().map(|e| e.unmatched).sum()
    }

    /// Rows skipped for an empty key, an empty reference or no value at all
    pub fn rows_skipped(&self) -> usize {
        let nodes: usize = self.sheets.iter().map(|s| s.rows_skipped + s.blank_rows).sum();
        nodes + self.edges().map(|e| e.rows_skipped).sum::<usize>()
    }

    fn edges(&self) -> impl Iterator<Item = &EdgeStats> {
        self.connections.iter().chain(&self.references)
    }
}

impl fmt::Display for PopulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.sheets {
            writeln!(
                f,
                "{} (key {}{}): {} created, {} updated, {} submitted, {} skipped, {} blank",
                s.sheet,
                s.primary_key,
                if s.synthetic_key { ", synthetic" } else { "" },
                s.nodes_created,
                s.nodes_updated,
                s.nodes_submitted,
                s.rows_skipped,
                s.blank_rows
            )?;
        }
        for e in self.edges() {
            writeln!(
                f,
                "({})-[:{}]->({}): {} created, {} existing, {} submitted, {} unmatched, {} skipped",
                e.source_sheet,
                e.relationship_type,
                e.target_sheet,
                e.edges_created,
                e.edges_existing,
                e.edges_submitted,
                e.unmatched,
                e.rows_skipped
            )?;
        }
        write!(
            f,
            "{} nodes merged, {} edges created, {} rows skipped",
            self.nodes_merged(),
            self.edges_created(),
            self.rows_skipped()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_totals() {
        let mut sheet = SheetStats {
            sheet: "Reaction".into(),
            primary_key: "well_id".into(),
            rows_skipped: 1,
            ..SheetStats::default()
        };
        sheet.record(NodeOutcome::Created);
        sheet.record(NodeOutcome::Updated);

        let mut edges = EdgeStats::new("Reaction", "Molecule", "SUBSTRATES".into());
        edges.record(EdgeOutcome { created: 2, existing: 1, submitted: false });
        edges.record(EdgeOutcome::default());
        edges.record(EdgeOutcome::submitted());

        let summary = PopulationSummary {
            sheets: vec![sheet],
            connections: Vec::new(),
            references: vec![edges],
        };
        assert_eq!(summary.nodes_created(), 1);
        assert_eq!(summary.nodes_merged(), 2);
        assert_eq!(summary.edges_created(), 2);
        assert_eq!(summary.edges_existing(), 1);
        assert_eq!(summary.edges_submitted(), 1);
        assert_eq!(summary.unmatched(), 1);
        assert_eq!(summary.rows_skipped(), 1);
        assert!(summary
            .to_string()
            .ends_with("2 nodes merged, 2 edges created, 1 rows skipped"));
    }
}
