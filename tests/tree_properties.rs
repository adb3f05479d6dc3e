use lineage_tree::alias::{AliasSource, AliasTable};
use lineage_tree::lineage::record::parent_of;
use lineage_tree::lineage::{
    AncestryResolver, BuildStrategy, LineageRecord, RecordRules, Tree, TreeBuilder,
};
use lineage_tree::reports::TreeSerializer;

const ANCHOR: &str = "B.1.1.529";

fn omicron_aliases() -> AliasTable {
    AliasTable::from_source(
        AliasSource::new()
            .simple("A", "")
            .simple("B", "")
            .simple("BA", "B.1.1.529")
            .simple("BQ", "B.1.1.529.5.3.1.1.1.1")
            .recombinant("XA", &["A.1", "B.2"])
            .recombinant("XBB", &["BA.2.10*", "BA.2.75*"]),
    )
    .unwrap()
}

fn record(canonical: &str, display: &str, rules: &RecordRules) -> LineageRecord {
    LineageRecord::new(canonical, Some("omicron date"), display, display, rules).unwrap()
}

fn build(records: Vec<LineageRecord>, strategy: BuildStrategy) -> Tree {
    let rules = RecordRules::default();
    TreeBuilder::new(AncestryResolver::new(&rules)).build(records, strategy)
}

#[test]
fn undotted_names_have_no_parent() {
    for name in ["A", "B", "XBB", "BA"] {
        assert_eq!(parent_of(name, ANCHOR), None);
    }
}

#[test]
fn dotted_names_lose_their_last_segment() {
    assert_eq!(parent_of("B.1.1.529.2.75", ANCHOR).as_deref(), Some("B.1.1.529.2"));
    assert_eq!(parent_of("B.1.617.2", ANCHOR).as_deref(), Some("B.1.617"));
    assert_eq!(parent_of(ANCHOR, ANCHOR), None);
}

#[test]
fn height_matches_line_of_descent() {
    let rules = RecordRules::default();
    let tree = build(
        vec![
            record("B.1.1.529", "BA", &rules),
            record("B.1.1.529.2", "BA.2", &rules),
            record("B.1.1.529.2.75", "BA.2.75", &rules),
            record("B.1.1.529.5.3.1.1.1.1.1", "BQ.1", &rules),
            record("XBB", "XBB", &rules),
            record("XBB.1", "XBB.1", &rules),
            record("XBB.1.5", "XBB.1.5", &rules),
        ],
        BuildStrategy::TwoPass,
    );

    for node in tree.nodes() {
        assert_eq!(node.height(), node.line_of_descent().len(), "{}", node.id());
    }
    assert_eq!(tree.get("B.1.1.529.2.75").unwrap().height(), 2);

    let nested = tree.get("XBB.1.5").unwrap();
    assert_eq!(nested.height(), 2);
    assert_eq!(nested.root_id(), "XBB");
}

#[test]
fn decompress_is_idempotent() {
    let aliases = omicron_aliases();
    for name in ["BA.2.75", "BQ.1.1", "XA.3", "XBB.1.5"] {
        let once = aliases.decompress(name);
        assert_eq!(aliases.decompress(&once), once, "{}", name);
    }
}

#[test]
fn recombinant_membership() {
    let aliases = omicron_aliases();

    assert!(aliases.contains_ancestor("XA.3", "B.2"));
    assert!(aliases.contains_ancestor("XA.3", "A.1"));
    assert!(!aliases.contains_ancestor("XA.3", "C.9"));
    assert!(aliases.contains_ancestor("XBB.1.5", "B.1.1.529.2.75"));
}

#[test]
fn single_root_is_rendered_directly() {
    let rules = RecordRules::default();
    let tree = build(
        vec![
            record("B.1.1.529", "BA", &rules),
            record("B.1.1.529.1", "BA.1", &rules),
        ],
        BuildStrategy::InsertionOrder,
    );

    let document = TreeSerializer::default().render(&tree);
    assert_eq!(document.id, "B.1.1.529");
    assert_eq!(document.height, Some(0));
    assert_eq!(document.children.len(), 1);
    assert_eq!(document.children[0].id, "B.1.1.529.1");
    assert_eq!(document.children[0].height, Some(1));
}

#[test]
fn several_roots_are_wrapped_in_insertion_order() {
    let rules = RecordRules::default();
    let tree = build(
        vec![
            record("B", "B", &rules),
            record("B.1.1.529", "BA", &rules),
            record("A", "A", &rules),
        ],
        BuildStrategy::TwoPass,
    );

    let document = TreeSerializer::new("root").render(&tree);
    assert_eq!(document.id, "root");
    let ids: Vec<&str> = document.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "B.1.1.529", "A"]);
}

#[test]
fn empty_tree_still_renders_the_wrapper() {
    let document = TreeSerializer::default().render(&build(Vec::new(), BuildStrategy::TwoPass));
    assert_eq!(document.id, "root");
    assert!(document.children.is_empty());
}

#[test]
fn insertion_order_leaves_early_children_unlinked() {
    let rules = RecordRules::default();

    let child_first = build(
        vec![
            record("B.1.1.529.1", "BA.1", &rules),
            record("B.1.1.529", "BA", &rules),
        ],
        BuildStrategy::InsertionOrder,
    );
    assert!(child_first.get("B.1.1.529").unwrap().children().is_empty());
    assert_eq!(child_first.orphans(), vec!["B.1.1.529.1".to_string()]);

    let parent_first = build(
        vec![
            record("B.1.1.529", "BA", &rules),
            record("B.1.1.529.1", "BA.1", &rules),
        ],
        BuildStrategy::InsertionOrder,
    );
    assert_eq!(
        parent_first.get("B.1.1.529").unwrap().children(),
        ["B.1.1.529.1".to_string()]
    );
}

#[test]
fn corrected_strategies_link_regardless_of_order() {
    let rules = RecordRules::default();
    for strategy in [BuildStrategy::TwoPass, BuildStrategy::DepthSorted] {
        let tree = build(
            vec![
                record("B.1.1.529.1", "BA.1", &rules),
                record("B.1.1.529", "BA", &rules),
            ],
            strategy,
        );
        assert!(tree.orphans().is_empty(), "{:?}", strategy);
        assert_eq!(tree.get("B.1.1.529").unwrap().children().len(), 1);
    }
}
