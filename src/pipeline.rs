use crate::alias::{AliasSource, AliasTable};
use crate::config::Config;
use crate::lineage::{AncestryResolver, LineageRecord, Tree, TreeBuilder};
use crate::reports::TreeSerializer;
use crate::storage::{
    FileFlatList, FileLastRunMarker, FileTreeStorage, FlatListStorage, LastRunMarker, TreeStorage,
};
use crate::types::{LineageRow, PipelineReport};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Everything one run consumes
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub rows: Vec<LineageRow>,
    pub aliases: AliasSource,
    /// Upstream version of the designation table, e.g. a URL or commit
    pub source_version: Option<String>,
    /// Rebuild even when the version matches the last run
    pub force: bool,
}

/// A built tree together with the alias table it was resolved against
#[derive(Debug)]
pub struct BuiltTree {
    pub tree: Tree,
    pub aliases: AliasTable,
    pub report: PipelineReport,
}

/// Drives a build: rows → records → tree → document → storage
pub struct LineagePipeline {
    config: Config,
    tree_storage: Arc<dyn TreeStorage>,
    flat_list: Arc<dyn FlatListStorage>,
    last_run: Arc<dyn LastRunMarker>,
}

impl LineagePipeline {
    pub fn new(
        config: Config,
        tree_storage: Arc<dyn TreeStorage>,
        flat_list: Arc<dyn FlatListStorage>,
        last_run: Arc<dyn LastRunMarker>,
    ) -> Result<Self> {
        config.validate().context("Invalid pipeline configuration")?;
        Ok(Self {
            config,
            tree_storage,
            flat_list,
            last_run,
        })
    }

    /// Pipeline backed by the files named in the storage settings
    pub async fn with_file_storage(config: Config) -> Result<Self> {
        let tree_storage = FileTreeStorage::open(&config.storage.tree_path).await?;
        let flat_list = FileFlatList::open(&config.storage.flat_list_path).await?;
        let last_run = FileLastRunMarker::open(&config.storage.last_run_path).await?;

        Self::new(
            config,
            Arc::new(tree_storage),
            Arc::new(flat_list),
            Arc::new(last_run),
        )
    }

    #[instrument(skip(self, input), fields(rows = input.rows.len()))]
    pub async fn run(&self, input: PipelineInput) -> Result<PipelineReport> {
        if let Some(version) = input.source_version.as_deref() {
            if !input.force && self.is_up_to_date(version).await? {
                info!("Designations unchanged since last run ({}); skipping", version);
                return Ok(PipelineReport {
                    skipped_unchanged: true,
                    rows_read: input.rows.len(),
                    ..PipelineReport::default()
                });
            }
        }

        let BuiltTree {
            tree, mut report, ..
        } = self.build(&input.rows, input.aliases)?;

        let document = TreeSerializer::new(self.config.output.super_root_id.clone()).render(&tree);
        let contents = self
            .config
            .output
            .format
            .formatter()
            .format(&document)
            .context("Failed to format tree document")?;
        self.tree_storage
            .write(&contents)
            .await
            .context("Failed to store tree document")?;

        let names: Vec<String> = tree.ids().to_vec();
        let previous = self.flat_list.read().await.context("Failed to read lineage list")?;
        report.new_lineages = names
            .iter()
            .filter(|name| !previous.contains(*name))
            .cloned()
            .collect();
        self.flat_list
            .write(&names)
            .await
            .context("Failed to store lineage list")?;

        if let Some(version) = input.source_version.as_deref() {
            self.last_run
                .write(version)
                .await
                .context("Failed to record last run")?;
        }

        info!(
            "Pipeline finished: {} inserted, {} rejected, {} new, {} orphaned",
            report.inserted,
            report.rejected,
            report.new_lineages.len(),
            report.orphans.len()
        );
        Ok(report)
    }

    /// Resolve aliases and build the tree without touching storage
    pub fn build(&self, rows: &[LineageRow], aliases: AliasSource) -> Result<BuiltTree> {
        build_tree(&self.config, rows, aliases)
    }

    async fn is_up_to_date(&self, version: &str) -> Result<bool> {
        let last = self
            .last_run
            .read()
            .await
            .context("Failed to read last-run marker")?;
        Ok(last.map(|run| run.version == version).unwrap_or(false))
    }
}

/// Resolve aliases and build the tree from `rows` under `config`.
///
/// Needs no storage, so read-only queries can build a tree without opening
/// any output files.
pub fn build_tree(config: &Config, rows: &[LineageRow], aliases: AliasSource) -> Result<BuiltTree> {
    let lineage = &config.lineage;
    let aliases = AliasTable::from_source_with(aliases, lineage.alias_options())
        .context("Alias source rejected")?;
    let rules = lineage.record_rules();

    let mut report = PipelineReport {
        rows_read: rows.len(),
        ..PipelineReport::default()
    };

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if !row.is_of_interest {
            report.not_of_interest += 1;
            continue;
        }

        match LineageRecord::from_row(row, &rules, &aliases) {
            Ok(record) => records.push(record),
            Err(err) if err.is_validation() && !config.build.fail_fast => {
                warn!("Skipping row {}: {}", row.display_name, err);
                report.rejected += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to admit row {}", row.display_name));
            }
        }
    }

    report.inserted = records.len();
    let resolver = AncestryResolver::new(&rules).memoized();
    let tree = TreeBuilder::new(resolver)
        .with_bridging_id(lineage.bridging_id.clone())
        .build(records, config.build.strategy);

    report.roots = tree.roots().len();
    report.orphans = tree.orphans();

    Ok(BuiltTree {
        tree,
        aliases,
        report,
    })
}
