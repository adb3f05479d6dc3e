use crate::alias::AliasTable;
use crate::error::{LineageError, Result};
use crate::lineage::builder::Tree;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Kind of ancestry edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Parent link carried by the tree document
    Tree,
    /// Additional parental line of a recombinant lineage
    Recombinant,
}

/// Ancestry as a directed acyclic graph.
///
/// Recombinant lineages get one edge per parental line, which the nested tree
/// document cannot express; the tree is a spanning projection of this graph.
pub struct AncestryGraph {
    graph: DiGraph<String, EdgeKind>,
    node_map: HashMap<String, NodeIndex>,
}

impl AncestryGraph {
    /// Build the graph from a finished tree and the alias table it was built with
    pub fn from_tree(tree: &Tree, aliases: &AliasTable) -> Self {
        let mut ancestry = Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        };

        // First pass: every tree node
        for id in tree.ids() {
            ancestry.ensure_node(id);
        }

        // Second pass: linked children
        for node in tree.nodes() {
            for child in node.children() {
                ancestry.add_edge(node.id(), child, EdgeKind::Tree);
            }
        }

        // Recombinant roots receive an edge from each parental line
        for id in tree.ids() {
            if let Some(candidates) = aliases.candidates(id) {
                for candidate in candidates {
                    let parent = aliases.decompress(candidate.trim_end_matches('*'));
                    ancestry.add_edge(&parent, id, EdgeKind::Recombinant);
                }
            }
        }

        debug!(
            "Ancestry graph has {} nodes and {} edges",
            ancestry.node_count(),
            ancestry.edge_count()
        );
        ancestry
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Direct parents of a lineage; more than one for recombinants
    pub fn parents(&self, id: &str) -> Result<Vec<String>> {
        let index = self.index_of(id)?;
        Ok(self.neighbors(index, Direction::Incoming))
    }

    pub fn children(&self, id: &str) -> Result<Vec<String>> {
        let index = self.index_of(id)?;
        Ok(self.neighbors(index, Direction::Outgoing))
    }

    /// Every lineage upstream of `id`, breadth first
    pub fn ancestors(&self, id: &str) -> Result<Vec<String>> {
        let index = self.index_of(id)?;
        Ok(self.breadth_first(index, Direction::Incoming))
    }

    /// Every lineage downstream of `id`, breadth first
    pub fn descendants(&self, id: &str) -> Result<Vec<String>> {
        let index = self.index_of(id)?;
        Ok(self.breadth_first(index, Direction::Outgoing))
    }

    pub fn is_recombinant(&self, id: &str) -> Result<bool> {
        let index = self.index_of(id)?;
        Ok(self
            .graph
            .edges_directed(index, Direction::Incoming)
            .any(|edge| *edge.weight() == EdgeKind::Recombinant))
    }

    /// Nodes with no incoming edges
    pub fn root_nodes(&self) -> Vec<String> {
        self.nodes_without(Direction::Incoming)
    }

    /// Nodes with no outgoing edges
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.nodes_without(Direction::Outgoing)
    }

    pub fn has_path(&self, from: &str, to: &str) -> Result<bool> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        Ok(from_index == to_index
            || self
                .breadth_first_indices(from_index, Direction::Outgoing)
                .contains(&to_index))
    }

    pub fn statistics(&self) -> GraphStatistics {
        let recombinant_edges = self
            .graph
            .edge_weights()
            .filter(|kind| **kind == EdgeKind::Recombinant)
            .count();

        GraphStatistics {
            total_nodes: self.node_count(),
            total_edges: self.edge_count(),
            recombinant_edges,
            root_nodes: self.root_nodes().len(),
            leaf_nodes: self.leaf_nodes().len(),
        }
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(index) = self.node_map.get(id) {
            return *index;
        }
        let index = self.graph.add_node(id.to_string());
        self.node_map.insert(id.to_string(), index);
        index
    }

    fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let from_index = self.ensure_node(from);
        let to_index = self.ensure_node(to);
        if from_index != to_index && self.graph.find_edge(from_index, to_index).is_none() {
            self.graph.add_edge(from_index, to_index, kind);
        }
    }

    fn index_of(&self, id: &str) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or_else(|| LineageError::UnknownLineage(id.to_string()))
    }

    fn neighbors(&self, index: NodeIndex, direction: Direction) -> Vec<String> {
        self.graph
            .neighbors_directed(index, direction)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    fn breadth_first(&self, start: NodeIndex, direction: Direction) -> Vec<String> {
        self.breadth_first_indices(start, direction)
            .into_iter()
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }

    fn breadth_first_indices(&self, start: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut visited = HashSet::new();
        let mut found = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(start);
        visited.insert(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(current, direction) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                    found.push(neighbor);
                }
            }
        }

        found
    }

    fn nodes_without(&self, direction: Direction) -> Vec<String> {
        self.graph
            .node_indices()
            .filter(|&n| self.graph.neighbors_directed(n, direction).next().is_none())
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub recombinant_edges: usize,
    pub root_nodes: usize,
    pub leaf_nodes: usize,
}
