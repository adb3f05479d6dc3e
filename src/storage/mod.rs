pub mod files;

pub use files::{FileFlatList, FileLastRunMarker, FileTreeStorage};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// When the tree was last rebuilt, and from which upstream version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastRun {
    pub at: NaiveDateTime,
    pub version: String,
}

/// Persistence of the "last processed" marker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LastRunMarker: Send + Sync {
    /// `None` when nothing has been processed yet
    async fn read(&self) -> Result<Option<LastRun>>;

    async fn write(&self, version: &str) -> Result<()>;
}

/// Persistence of a flat list of lineage names
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FlatListStorage: Send + Sync {
    async fn read(&self) -> Result<BTreeSet<String>>;

    async fn write(&self, entries: &[String]) -> Result<()>;
}

/// Destination of the rendered tree document
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TreeStorage: Send + Sync {
    async fn write(&self, document: &str) -> Result<()>;
}
