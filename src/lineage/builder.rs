use crate::error::{LineageError, Result};
use crate::lineage::record::LineageRecord;
use crate::lineage::resolver::AncestryResolver;
use crate::types::{NodeSummary, ParentDocument};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info, warn};

/// How records are linked into the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStrategy {
    /// Link each record as it arrives; a child seen before its parent is orphaned
    InsertionOrder,
    /// Stable-sort records by ancestry depth, shallowest first, then insert
    DepthSorted,
    /// Index every record first, then link in arrival order
    #[default]
    TwoPass,
}

impl std::str::FromStr for BuildStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "insertion_order" => Ok(Self::InsertionOrder),
            "depth_sorted" => Ok(Self::DepthSorted),
            "two_pass" => Ok(Self::TwoPass),
            other => Err(format!("unknown build strategy: {}", other)),
        }
    }
}

/// A lineage placed in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    id: String,
    record: LineageRecord,
    height: usize,
    line_of_descent: Vec<String>,
    root_id: String,
    children: Vec<String>,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn record(&self) -> &LineageRecord {
        &self.record
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Ancestor ids, nearest first
    pub fn line_of_descent(&self) -> &[String] {
        &self.line_of_descent
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.record.parent_id()
    }

    /// Ids of linked children, in link order
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.record.parent_id().is_none()
    }

    /// Snapshot of this node without child links
    pub fn to_summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            lineage: self.record.to_document(),
            height: self.height,
            parent: ParentDocument {
                line_of_descent: Some(self.line_of_descent.clone()),
                root_id: Some(self.root_id.clone()),
            },
        }
    }
}

/// Lineage nodes indexed by id, plus the ordered list of roots
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes_by_id: HashMap<String, TreeNode>,
    roots: Vec<String>,
    insertion_order: Vec<String>,
    /// Children waiting on a bridging id that has no node yet
    pending: HashMap<String, Vec<String>>,
}

impl Tree {
    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes_by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes_by_id.contains_key(id)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// The single root standing for the whole tree, if there is exactly one
    pub fn sole_root(&self) -> Option<&TreeNode> {
        match self.roots.as_slice() {
            [only] => self.get(only),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_by_id.is_empty()
    }

    /// Node ids in the order they were first inserted
    pub fn ids(&self) -> &[String] {
        &self.insertion_order
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.insertion_order.iter().filter_map(|id| self.get(id))
    }

    pub fn children_of(&self, id: &str) -> Vec<&TreeNode> {
        self.get(id)
            .map(|node| node.children.iter().filter_map(|c| self.get(c)).collect())
            .unwrap_or_default()
    }

    /// Ids present in the index but not reachable from any root
    pub fn orphans(&self) -> Vec<String> {
        let reachable = self.reachable_from_roots();
        self.insertion_order
            .iter()
            .filter(|id| !reachable.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Ancestor snapshots of `id`, nearest first, root-most last
    pub fn progenitors(&self, id: &str) -> Result<Vec<NodeSummary>> {
        let node = self
            .get(id)
            .ok_or_else(|| LineageError::UnknownLineage(id.to_string()))?;

        Ok(node
            .line_of_descent
            .iter()
            .filter_map(|ancestor| self.get(ancestor))
            .map(TreeNode::to_summary)
            .collect())
    }

    fn reachable_from_roots(&self) -> HashSet<&str> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&str> = self.roots.iter().map(String::as_str).collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.get(current) {
                queue.extend(node.children.iter().map(String::as_str));
            }
        }

        visited
    }
}

/// Accumulates records into a [`Tree`].
///
/// Each builder owns its tree, so independent builds never share state.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    resolver: AncestryResolver<'a>,
    bridging_id: Option<String>,
    tree: Tree,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(resolver: AncestryResolver<'a>) -> Self {
        Self {
            resolver,
            bridging_id: None,
            tree: Tree::default(),
        }
    }

    /// Accept children of `id` even before a node for `id` has been inserted
    pub fn with_bridging_id(mut self, id: Option<String>) -> Self {
        self.bridging_id = id;
        self
    }

    /// Insert one record and link it under its parent if the parent is
    /// already known.
    ///
    /// A record arriving before its parent stays in the index but is never
    /// linked, so it is unreachable from the roots. Re-inserting an id
    /// replaces the stored node and keeps the children linked under that id.
    pub fn insert(&mut self, record: LineageRecord) -> &TreeNode {
        let id = self.index(record);
        if !self.link(&id) && !self.tree.nodes_by_id[&id].is_root() {
            debug!("Parent of {} not yet inserted; node left unlinked", id);
        }
        &self.tree.nodes_by_id[&id]
    }

    /// Build a tree from `records` with the given strategy
    pub fn build<I>(mut self, records: I, strategy: BuildStrategy) -> Tree
    where
        I: IntoIterator<Item = LineageRecord>,
    {
        match strategy {
            BuildStrategy::InsertionOrder => {
                for record in records {
                    self.insert(record);
                }
            }
            BuildStrategy::DepthSorted => {
                let mut records: Vec<_> = records
                    .into_iter()
                    .map(|r| (self.resolver.line_of_descent(r.parent_id()).len(), r))
                    .collect();
                records.sort_by_key(|(depth, _)| *depth);
                for (_, record) in records {
                    self.insert(record);
                }
            }
            BuildStrategy::TwoPass => {
                for record in records {
                    self.index(record);
                }
                let ids = self.tree.insertion_order.clone();
                for id in &ids {
                    self.link(id);
                }
            }
        }

        let tree = self.finish();
        info!(
            "Built lineage tree with {} nodes and {} roots using {:?}",
            tree.len(),
            tree.roots().len(),
            strategy
        );
        tree
    }

    pub fn progenitors(&self, id: &str) -> Result<Vec<NodeSummary>> {
        self.tree.progenitors(id)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn finish(self) -> Tree {
        let orphans = self.tree.orphans().len();
        if orphans > 0 {
            warn!("{} lineages are unreachable from any root", orphans);
        }
        self.tree
    }

    /// Store the node for `record` without linking it; returns its id
    fn index(&mut self, record: LineageRecord) -> String {
        let id = record.id().to_string();
        let line_of_descent = self.resolver.line_of_descent(record.parent_id());
        let root_id = line_of_descent.last().cloned().unwrap_or_else(|| id.clone());
        let is_root = record.parent_id().is_none();

        let mut node = TreeNode {
            id: id.clone(),
            record,
            height: line_of_descent.len(),
            line_of_descent,
            root_id,
            children: Vec::new(),
        };

        match self.tree.nodes_by_id.remove(&id) {
            Some(previous) => {
                debug!("Replacing previously inserted lineage {}", id);
                node.children = previous.children;
            }
            None => self.tree.insertion_order.push(id.clone()),
        }

        if let Some(waiting) = self.tree.pending.remove(&id) {
            for child in waiting {
                push_unique(&mut node.children, child);
            }
        }

        if is_root && !self.tree.roots.contains(&id) {
            self.tree.roots.push(id.clone());
        }

        self.tree.nodes_by_id.insert(id.clone(), node);
        id
    }

    /// Append `id` to its parent's children; false when there is nothing to link to
    fn link(&mut self, id: &str) -> bool {
        let Some(parent_id) = self
            .tree
            .get(id)
            .and_then(|node| node.parent_id())
            .map(str::to_string)
        else {
            return false;
        };

        if let Some(parent) = self.tree.nodes_by_id.get_mut(&parent_id) {
            push_unique(&mut parent.children, id.to_string());
            return true;
        }

        if self.bridging_id.as_deref() == Some(parent_id.as_str()) {
            push_unique(
                self.tree.pending.entry(parent_id).or_default(),
                id.to_string(),
            );
            return true;
        }

        false
    }
}

fn push_unique(children: &mut Vec<String>, id: String) {
    if !children.contains(&id) {
        children.push(id);
    }
}
