use crate::alias::{AliasOptions, AliasSource, AliasTable};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Alias key document on disk
#[derive(Debug, Clone)]
pub struct AliasFile {
    path: PathBuf,
}

impl AliasFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load_source(&self) -> Result<AliasSource> {
        debug!("Loading alias key from: {:?}", self.path);

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read alias key from {:?}", self.path))?;

        AliasSource::from_json(&content)
            .with_context(|| format!("Failed to parse alias key {:?}", self.path))
    }

    /// Load and validate the alias table
    pub fn load_table(&self, options: AliasOptions) -> Result<AliasTable> {
        let source = self.load_source()?;
        let entries = source.len();
        let table = AliasTable::from_source_with(source, options)
            .with_context(|| format!("Alias key {:?} is not usable", self.path))?;

        info!("Loaded {} aliases from {} entries", table.len(), entries);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LineageError;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_table() {
        let file = NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            r#"{"A": "", "B": "", "BA": "B.1.1.529", "XBB": ["BA.2.10.1", "BA.2.75"]}"#,
        )
        .unwrap();

        let table = AliasFile::new(file.path())
            .load_table(AliasOptions::default())
            .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.is_recombinant("XBB"));
    }

    #[test]
    fn test_cyclic_key_is_rejected_with_cause() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"XP": ["XQ.1"], "XQ": ["XP.1"]}"#).unwrap();

        let err = AliasFile::new(file.path())
            .load_table(AliasOptions::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LineageError>(),
            Some(LineageError::CyclicAlias { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "{not json").unwrap();
        assert!(AliasFile::new(file.path()).load_source().is_err());
    }
}
