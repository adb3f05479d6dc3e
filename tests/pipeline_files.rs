use lineage_tree::config::Config;
use lineage_tree::lineage::AncestryGraph;
use lineage_tree::pipeline::{build_tree, LineagePipeline, PipelineInput};
use lineage_tree::sources::{AliasFile, DesignationTable};
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

const DESIGNATIONS: &str = "pango\tpartial\tunaliased\tdesignation_date\tof_interest\n\
    BA\tBA\tB.1.1.529\tomicron date\ttrue\n\
    BA.1\tBA.1\tB.1.1.529.1\tomicron date\ttrue\n\
    BA.2\tBA.2\t\t2021-12-07\ttrue\n\
    BA.3\tBA.3\tB.1.1.529.3\t#N/A\ttrue\n\
    B.1.617.2\tB.1.617.2\tB.1.617.2\t2021-05-11\tfalse\n";

fn write_inputs(dir: &TempDir) -> (DesignationTable, AliasFile) {
    let designations = dir.path().join("lineages.tsv");
    let aliases = dir.path().join("alias_key.json");
    fs::write(&designations, DESIGNATIONS).unwrap();
    fs::write(
        &aliases,
        json!({ "A": "", "B": "", "BA": "B.1.1.529", "XA": ["A.1", "B.2"] }).to_string(),
    )
    .unwrap();
    (DesignationTable::new(designations), AliasFile::new(aliases))
}

fn file_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.storage.tree_path = dir.path().join("out/lineage_tree.json");
    config.storage.flat_list_path = dir.path().join("out/lineages.txt");
    config.storage.last_run_path = dir.path().join("out/last_run.txt");
    config
}

#[tokio::test]
async fn build_writes_tree_and_list_then_skips_unchanged_source() {
    let dir = TempDir::new().unwrap();
    let (designations, aliases) = write_inputs(&dir);
    let config = file_config(&dir);
    let pipeline = LineagePipeline::with_file_storage(config.clone()).await.unwrap();

    let input = PipelineInput {
        rows: designations.load_rows().unwrap(),
        aliases: aliases.load_source().unwrap(),
        source_version: Some("abc123".to_string()),
        force: false,
    };
    let report = pipeline.run(input.clone()).await.unwrap();

    assert_eq!(report.rows_read, 5);
    assert_eq!(report.not_of_interest, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.inserted, 3);
    assert_eq!(report.roots, 1);
    assert_eq!(report.new_lineages.len(), 3);

    let tree: Value =
        serde_json::from_str(&fs::read_to_string(&config.storage.tree_path).unwrap()).unwrap();
    assert_eq!(tree["id"], "B.1.1.529");
    assert_eq!(tree["height"], 0);
    assert_eq!(tree["lineage"]["designationDate"], "omicron date");
    assert_eq!(tree["children"][0]["id"], "B.1.1.529.1");
    assert_eq!(tree["children"][0]["height"], 1);
    assert_eq!(tree["children"][1]["id"], "B.1.1.529.2");
    assert_eq!(tree["children"][1]["parent"]["lineOfDescent"], json!(["B.1.1.529"]));

    let list = fs::read_to_string(&config.storage.flat_list_path).unwrap();
    assert_eq!(list, "B.1.1.529\nB.1.1.529.1\nB.1.1.529.2\n");

    let again = pipeline.run(input.clone()).await.unwrap();
    assert!(again.skipped_unchanged);

    let forced = pipeline
        .run(PipelineInput {
            force: true,
            ..input
        })
        .await
        .unwrap();
    assert!(!forced.skipped_unchanged);
    assert!(forced.new_lineages.is_empty());
}

#[test]
fn ancestry_graph_over_built_tree() {
    let dir = TempDir::new().unwrap();
    let (designations, aliases) = write_inputs(&dir);
    let config = file_config(&dir);

    let built = build_tree(
        &config,
        &designations.load_rows().unwrap(),
        aliases.load_source().unwrap(),
    )
    .unwrap();
    assert!(!dir.path().join("out").exists());

    let progenitors = built.tree.progenitors("B.1.1.529.2").unwrap();
    assert_eq!(progenitors.len(), 1);
    assert_eq!(progenitors[0].id, "B.1.1.529");

    let graph = AncestryGraph::from_tree(&built.tree, &built.aliases);
    assert_eq!(graph.parents("B.1.1.529.1").unwrap(), vec!["B.1.1.529".to_string()]);
    assert!(graph.has_path("B.1.1.529", "B.1.1.529.2").unwrap());
}
