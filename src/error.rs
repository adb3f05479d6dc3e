use thiserror::Error;

/// Errors raised by the alias and tree-building core
#[derive(Debug, Error)]
pub enum LineageError {
    /// Malformed or self-contradictory alias source data
    #[error("invalid alias configuration: {0}")]
    Configuration(String),

    /// Alias expansion loops back on itself or never bottoms out
    #[error("alias '{alias}' has a cyclic or unbounded expansion")]
    CyclicAlias { alias: String },

    /// A record that cannot be admitted into the tree
    #[error("lineage '{lineage}' rejected: {reason}")]
    Validation { lineage: String, reason: String },

    #[error("lineage '{0}' is not present in the tree")]
    UnknownLineage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl LineageError {
    pub fn validation(lineage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            lineage: lineage.into(),
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type Result<T> = std::result::Result<T, LineageError>;
