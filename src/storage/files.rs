use super::{FlatListStorage, LastRun, LastRunMarker, TreeStorage};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Create the file if it is missing, leaving existing contents untouched
async fn touch(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {:?}", path))?;
    Ok(())
}

/// Last-run marker kept as a single `timestamp, version` line
#[derive(Debug, Clone)]
pub struct FileLastRunMarker {
    path: PathBuf,
}

impl FileLastRunMarker {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        touch(&path).await?;
        Ok(Self { path })
    }
}

#[async_trait]
impl LastRunMarker for FileLastRunMarker {
    async fn read(&self) -> Result<Option<LastRun>> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read last-run marker {:?}", self.path))?;

        let Some(line) = content.lines().next().map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(None);
        };
        let Some((timestamp, version)) = line.split_once(", ") else {
            bail!("Malformed last-run marker {:?}: {}", self.path, line);
        };
        let at = NaiveDateTime::parse_from_str(timestamp, DATE_FORMAT)
            .with_context(|| format!("Invalid timestamp in last-run marker: {}", timestamp))?;

        Ok(Some(LastRun {
            at,
            version: version.to_string(),
        }))
    }

    async fn write(&self, version: &str) -> Result<()> {
        let now = Local::now().format(DATE_FORMAT);
        fs::write(&self.path, format!("{}, {}\n", now, version))
            .await
            .with_context(|| format!("Failed to write last-run marker {:?}", self.path))?;
        debug!("Recorded last run for version {}", version);
        Ok(())
    }
}

/// Newline-separated list of names
#[derive(Debug, Clone)]
pub struct FileFlatList {
    path: PathBuf,
}

impl FileFlatList {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        touch(&path).await?;
        Ok(Self { path })
    }
}

#[async_trait]
impl FlatListStorage for FileFlatList {
    async fn read(&self) -> Result<BTreeSet<String>> {
        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read list {:?}", self.path))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn write(&self, entries: &[String]) -> Result<()> {
        let mut content = String::with_capacity(entries.iter().map(|e| e.len() + 1).sum());
        for entry in entries {
            content.push_str(entry);
            content.push('\n');
        }
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write list {:?}", self.path))?;
        debug!("Wrote {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}

/// Rendered tree document on disk
#[derive(Debug, Clone)]
pub struct FileTreeStorage {
    path: PathBuf,
}

impl FileTreeStorage {
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        touch(&path).await?;
        Ok(Self { path })
    }
}

#[async_trait]
impl TreeStorage for FileTreeStorage {
    async fn write(&self, document: &str) -> Result<()> {
        fs::write(&self.path, document)
            .await
            .with_context(|| format!("Failed to write tree document to {:?}", self.path))?;
        info!("Tree document written to: {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_last_run_marker_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let marker = FileLastRunMarker::open(temp_dir.path().join("last_run.txt"))
            .await
            .unwrap();

        assert_eq!(marker.read().await.unwrap(), None);

        marker.write("https://example.org/lineages.tsv@abc123").await.unwrap();
        let last = marker.read().await.unwrap().unwrap();
        assert_eq!(last.version, "https://example.org/lineages.tsv@abc123");
    }

    #[tokio::test]
    async fn test_open_does_not_truncate() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("seen.txt");
        std::fs::write(&path, "BA.1\nBA.2\n").unwrap();

        let list = FileFlatList::open(&path).await.unwrap();
        let entries = list.read().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains("BA.2"));
    }

    #[tokio::test]
    async fn test_flat_list_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let list = FileFlatList::open(temp_dir.path().join("nested/seen.txt"))
            .await
            .unwrap();

        list.write(&["BA.2".to_string(), "BA.1".to_string()]).await.unwrap();
        let content = std::fs::read_to_string(temp_dir.path().join("nested/seen.txt")).unwrap();
        assert_eq!(content, "BA.2\nBA.1\n");
    }

    #[tokio::test]
    async fn test_malformed_marker() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("last_run.txt");
        std::fs::write(&path, "yesterday\n").unwrap();

        let marker = FileLastRunMarker::open(&path).await.unwrap();
        assert!(marker.read().await.is_err());
    }

    #[test]
    fn test_tree_storage_writes_document() {
        tokio_test::block_on(async {
            let temp_dir = TempDir::new().unwrap();
            let path = temp_dir.path().join("tree.json");
            let storage = FileTreeStorage::open(&path).await.unwrap();

            storage.write("{\"id\":\"B.1.1.529\"}").await.unwrap();
            assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"id\":\"B.1.1.529\"}");
        });
    }
}
