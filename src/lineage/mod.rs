pub mod builder;
pub mod graph;
pub mod record;
pub mod resolver;

pub use builder::{BuildStrategy, Tree, TreeBuilder, TreeNode};
pub use graph::AncestryGraph;
pub use record::{LineageRecord, RecordRules};
pub use resolver::AncestryResolver;
