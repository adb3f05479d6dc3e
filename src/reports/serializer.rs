use crate::lineage::builder::{Tree, TreeNode};
use crate::types::{LineageDocument, NodeDocument, ParentDocument};
use tracing::debug;

pub const DEFAULT_SUPER_ROOT_ID: &str = "root";

/// Renders a built tree into the nested output document
#[derive(Debug, Clone)]
pub struct TreeSerializer {
    super_root_id: String,
}

impl Default for TreeSerializer {
    fn default() -> Self {
        Self::new(DEFAULT_SUPER_ROOT_ID)
    }
}

impl TreeSerializer {
    pub fn new(super_root_id: impl Into<String>) -> Self {
        Self {
            super_root_id: super_root_id.into(),
        }
    }

    /// A single root is rendered directly; zero or several roots are wrapped
    /// in a synthetic super-root, in root insertion order
    pub fn render(&self, tree: &Tree) -> NodeDocument {
        if let Some(root) = tree.sole_root() {
            return self.subtree(tree, root);
        }

        debug!("Wrapping {} roots in synthetic super-root", tree.roots().len());
        let children = tree
            .roots()
            .iter()
            .filter_map(|id| tree.get(id))
            .map(|root| self.subtree(tree, root))
            .collect();

        NodeDocument {
            id: self.super_root_id.clone(),
            lineage: LineageDocument {
                display_name: self.super_root_id.clone(),
                partial_name: self.super_root_id.clone(),
                canonical_name: self.super_root_id.clone(),
                designation_date: None,
            },
            height: None,
            parent: ParentDocument {
                line_of_descent: None,
                root_id: None,
            },
            children,
        }
    }

    /// Document for `node` and everything linked beneath it
    pub fn subtree(&self, tree: &Tree, node: &TreeNode) -> NodeDocument {
        NodeDocument {
            id: node.id().to_string(),
            lineage: node.record().to_document(),
            height: Some(node.height()),
            parent: ParentDocument {
                line_of_descent: Some(node.line_of_descent().to_vec()),
                root_id: Some(node.root_id().to_string()),
            },
            children: tree
                .children_of(node.id())
                .into_iter()
                .map(|child| self.subtree(tree, child))
                .collect(),
        }
    }
}
