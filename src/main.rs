use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lineage_tree::{
    config::Config,
    lineage::{AncestryGraph, BuildStrategy},
    pipeline::{build_tree, LineagePipeline, PipelineInput},
    reports::OutputFormat,
    sources::{AliasFile, DesignationTable},
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lineage-tree")]
#[command(about = "Resolve lineage aliases and build the designation ancestry tree")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the lineage tree document
    Build {
        /// Tab-separated designation table
        #[arg(short, long)]
        designations: PathBuf,

        /// JSON alias key
        #[arg(short, long)]
        aliases: PathBuf,

        /// Output file path (defaults to the configured tree path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (json, compact, text)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Build strategy (two_pass, depth_sorted, insertion_order)
        #[arg(short, long)]
        strategy: Option<BuildStrategy>,

        /// Upstream version of the designation table
        #[arg(long)]
        source_version: Option<String>,

        /// Rebuild even if the source version has not changed
        #[arg(long)]
        force: bool,
    },

    /// Print the ancestors of one lineage
    Ancestry {
        #[arg(short, long)]
        designations: PathBuf,

        #[arg(short, long)]
        aliases: PathBuf,

        /// Canonical or aliased lineage name
        lineage: String,
    },

    /// Validate an alias key
    CheckAliases {
        #[arg(short, long)]
        aliases: PathBuf,
    },

    /// Initialize configuration file
    Init {
        /// Configuration file path
        #[arg(short, long, default_value = "lineage-tree.yml")]
        config_file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level)?;

    let mut config = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Commands::Build {
            designations,
            aliases,
            output,
            format,
            strategy,
            source_version,
            force,
        } => {
            if let Some(output) = output {
                config.storage.tree_path = output;
            }
            if let Some(format) = format {
                config.output.format = format;
            }
            if let Some(strategy) = strategy {
                config.build.strategy = strategy;
            }
            build(config, designations, aliases, source_version, force).await?;
        }

        Commands::Ancestry {
            designations,
            aliases,
            lineage,
        } => {
            ancestry(config, designations, aliases, &lineage)?;
        }

        Commands::CheckAliases { aliases } => {
            let table = AliasFile::new(&aliases).load_table(config.lineage.alias_options())?;
            println!("{:?}: {} aliases OK", aliases, table.len());
        }

        Commands::Init { config_file } => {
            init_config(config_file).await?;
        }
    }

    Ok(())
}

/// Initialize tracing with the specified log level
fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
        .context("Failed to create env filter")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(env_filter)
        .init();

    Ok(())
}

/// Load configuration from file or use defaults, then apply environment overrides
async fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match config_path {
        Some(path) if path.exists() => {
            info!("Loading configuration from: {:?}", path);
            Config::load_from_file(path).await?
        }
        Some(path) => {
            warn!("Configuration file not found: {:?}. Using defaults.", path);
            Config::default()
        }
        None => Config::default(),
    };

    config.merge_with(Config::load_from_env()?);
    config.validate()?;
    Ok(config)
}

async fn build(
    config: Config,
    designations: PathBuf,
    aliases: PathBuf,
    source_version: Option<String>,
    force: bool,
) -> Result<()> {
    let rows = DesignationTable::new(&designations).load_rows()?;
    let aliases = AliasFile::new(&aliases).load_source()?;

    let pipeline = LineagePipeline::with_file_storage(config).await?;
    let report = pipeline
        .run(PipelineInput {
            rows,
            aliases,
            source_version,
            force,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn ancestry(config: Config, designations: PathBuf, aliases: PathBuf, lineage: &str) -> Result<()> {
    let rows = DesignationTable::new(&designations).load_rows()?;
    let source = AliasFile::new(&aliases).load_source()?;

    let built = build_tree(&config, &rows, source)?;

    let id = match built.tree.get(lineage) {
        Some(node) => node.id().to_string(),
        None => built.aliases.decompress(lineage),
    };
    let progenitors = built
        .tree
        .progenitors(&id)
        .with_context(|| format!("Lineage {} was not built", lineage))?;
    let parents = AncestryGraph::from_tree(&built.tree, &built.aliases).parents(&id)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "id": id,
            "parents": parents,
            "progenitors": progenitors,
        }))?
    );
    Ok(())
}

/// Initialize configuration file
async fn init_config(config_file: PathBuf) -> Result<()> {
    if config_file.exists() {
        warn!("Configuration file already exists: {:?}; leaving it untouched", config_file);
        return Ok(());
    }

    Config::default()
        .save_to_file(&config_file)
        .await
        .with_context(|| format!("Failed to write configuration file: {:?}", config_file))?;

    info!("Configuration file created successfully: {:?}", config_file);
    println!("Configuration file created: {:?}", config_file);
    Ok(())
}
