/// Configuration management for the lineage tree builder
use crate::alias::AliasOptions;
use crate::lineage::builder::BuildStrategy;
use crate::lineage::record::{RecordRules, DEFAULT_ANCHOR_STRAIN};
use crate::reports::formatters::OutputFormat;
use crate::reports::serializer::DEFAULT_SUPER_ROOT_ID;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lineage: LineageSettings,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageSettings {
    pub anchor_strain: String,
    pub bridging_id: Option<String>,
    pub recombinant_marker: char,
    pub date_sentinels: Vec<String>,
    pub max_alias_depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub strategy: BuildStrategy,
    pub fail_fast: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub super_root_id: String,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub tree_path: PathBuf,
    pub flat_list_path: PathBuf,
    pub last_run_path: PathBuf,
}

impl Default for LineageSettings {
    fn default() -> Self {
        let rules = RecordRules::default();
        let aliases = AliasOptions::default();
        Self {
            anchor_strain: DEFAULT_ANCHOR_STRAIN.to_string(),
            bridging_id: None,
            recombinant_marker: aliases.recombinant_marker,
            date_sentinels: rules.date_sentinels,
            max_alias_depth: aliases.max_depth,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            super_root_id: DEFAULT_SUPER_ROOT_ID.to_string(),
            format: OutputFormat::Json,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            tree_path: PathBuf::from("lineage_tree.json"),
            flat_list_path: PathBuf::from("lineages.txt"),
            last_run_path: PathBuf::from("last_run.txt"),
        }
    }
}

impl LineageSettings {
    pub fn record_rules(&self) -> RecordRules {
        RecordRules {
            anchor_strain: self.anchor_strain.clone(),
            date_sentinels: self.date_sentinels.clone(),
        }
    }

    pub fn alias_options(&self) -> AliasOptions {
        AliasOptions {
            recombinant_marker: self.recombinant_marker,
            max_depth: self.max_alias_depth,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse configuration file")?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override settings from `LINEAGE_TREE_*` variables supplied by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(anchor) = lookup("LINEAGE_TREE_ANCHOR_STRAIN") {
            self.lineage.anchor_strain = anchor;
        }

        if let Some(bridging) = lookup("LINEAGE_TREE_BRIDGING_ID") {
            self.lineage.bridging_id = Some(bridging).filter(|b| !b.is_empty());
        }

        if let Some(depth) = lookup("LINEAGE_TREE_MAX_ALIAS_DEPTH") {
            self.lineage.max_alias_depth = depth
                .parse()
                .with_context(|| format!("Invalid LINEAGE_TREE_MAX_ALIAS_DEPTH: {}", depth))?;
        }

        if let Some(strategy) = lookup("LINEAGE_TREE_BUILD_STRATEGY") {
            self.build.strategy = strategy.parse().map_err(anyhow::Error::msg)?;
        }

        if let Some(fail_fast) = lookup("LINEAGE_TREE_FAIL_FAST") {
            self.build.fail_fast = fail_fast
                .parse()
                .with_context(|| format!("Invalid LINEAGE_TREE_FAIL_FAST: {}", fail_fast))?;
        }

        if let Some(format) = lookup("LINEAGE_TREE_OUTPUT_FORMAT") {
            self.output.format = format.parse().map_err(anyhow::Error::msg)?;
        }

        if let Some(path) = lookup("LINEAGE_TREE_OUTPUT_PATH") {
            self.storage.tree_path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Merge with another configuration (other takes precedence where it differs from defaults)
    pub fn merge_with(&mut self, other: Config) {
        let defaults = Config::default();

        if other.lineage.anchor_strain != defaults.lineage.anchor_strain {
            self.lineage.anchor_strain = other.lineage.anchor_strain;
        }
        if other.lineage.bridging_id.is_some() {
            self.lineage.bridging_id = other.lineage.bridging_id;
        }
        if other.lineage.recombinant_marker != defaults.lineage.recombinant_marker {
            self.lineage.recombinant_marker = other.lineage.recombinant_marker;
        }
        if other.lineage.date_sentinels != defaults.lineage.date_sentinels {
            self.lineage.date_sentinels = other.lineage.date_sentinels;
        }
        if other.lineage.max_alias_depth != defaults.lineage.max_alias_depth {
            self.lineage.max_alias_depth = other.lineage.max_alias_depth;
        }

        if other.build.strategy != defaults.build.strategy {
            self.build.strategy = other.build.strategy;
        }
        self.build.fail_fast = self.build.fail_fast || other.build.fail_fast;

        if other.output != defaults.output {
            self.output = other.output;
        }
        if other.storage != defaults.storage {
            self.storage = other.storage;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.lineage.anchor_strain.trim().is_empty() {
            return Err(anyhow::anyhow!("Anchor strain must not be empty"));
        }

        if self.lineage.max_alias_depth == 0 {
            return Err(anyhow::anyhow!("Maximum alias depth must be greater than 0"));
        }

        if self.lineage.recombinant_marker == '.' {
            return Err(anyhow::anyhow!("Recombinant marker cannot be the name separator"));
        }

        if self.output.super_root_id.trim().is_empty() {
            return Err(anyhow::anyhow!("Super-root id must not be empty"));
        }

        Ok(())
    }
}
