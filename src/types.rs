use serde::{Deserialize, Serialize};

/// Core types shared between the lineage engine and its collaborators

/// One row of the designation table, as handed over by the tabular-data collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageRow {
    pub display_name: String,
    pub partial_name: String,
    pub canonical_name: String,
    pub designation_date: Option<String>,
    pub is_of_interest: bool,
}

impl LineageRow {
    pub fn new(
        display_name: impl Into<String>,
        partial_name: impl Into<String>,
        canonical_name: impl Into<String>,
        designation_date: Option<&str>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            partial_name: partial_name.into(),
            canonical_name: canonical_name.into(),
            designation_date: designation_date.map(str::to_string),
            is_of_interest: true,
        }
    }

    pub fn not_of_interest(mut self) -> Self {
        self.is_of_interest = false;
        self
    }
}

/// Value side of an alias source entry: a plain prefix or a recombinant parent list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasValue {
    Single(String),
    Recombinant(Vec<String>),
}

/// Lineage naming block of an output node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageDocument {
    pub display_name: String,
    pub partial_name: String,
    pub canonical_name: String,
    pub designation_date: Option<String>,
}

/// Descent block of an output node; both fields are null on the synthetic super-root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDocument {
    pub line_of_descent: Option<Vec<String>>,
    pub root_id: Option<String>,
}

/// Nested tree document handed to the storage collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: String,
    pub lineage: LineageDocument,
    pub height: Option<usize>,
    pub parent: ParentDocument,
    pub children: Vec<NodeDocument>,
}

/// Ancestor snapshot without child links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub lineage: LineageDocument,
    pub height: usize,
    pub parent: ParentDocument,
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub skipped_unchanged: bool,
    pub rows_read: usize,
    pub not_of_interest: usize,
    pub rejected: usize,
    pub inserted: usize,
    pub roots: usize,
    pub orphans: Vec<String>,
    pub new_lineages: Vec<String>,
}
