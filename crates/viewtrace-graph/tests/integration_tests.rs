//! End-to-end tests: SQL files on disk to rendered dependency trees

use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use viewtrace_core::{Config, Identifier, MatchMode, Normalizer};
use viewtrace_graph::{render, GraphBuilder, MatchResolver, Resolution, ReverseIndex};
use viewtrace_sql::FileScanner;

fn write(root: &Path, relative: &str, sql: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, sql).unwrap();
}

fn exact() -> MatchResolver {
    MatchResolver::new(Normalizer::default(), MatchMode::Exact)
}

fn suffix() -> MatchResolver {
    MatchResolver::new(Normalizer::default(), MatchMode::Suffix)
}

#[test]
fn chain_of_views_renders_full_tree() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "views/v1.sql", "CREATE VIEW v1 AS\nSELECT * FROM t1;");
    write(dir.path(), "views/nested/v2.sql", "create view v2 as select * from v1");

    let graph = GraphBuilder::default().build_from_dir(dir.path());
    let roots = exact().resolve("T1", &graph);
    let trees = render(&roots, &graph);

    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].to_text(), "t1\n└── v1\n    └── v2\n");
}

#[test]
fn non_definition_file_contributes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "adhoc.sql", "select * from secret_table join other_table using (id)");
    write(dir.path(), "v.sql", "create view v as select * from t");

    let graph = GraphBuilder::default().build_from_dir(dir.path());

    assert_eq!(graph.definition_count(), 1);
    assert!(exact().resolve("secret_table", &graph).is_empty());
    assert!(suffix().resolve("other_table", &graph).is_empty());
}

#[test]
fn known_leaf_and_unknown_name_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "v.sql", "create view reporting.v as select * from raw.t");

    let graph = GraphBuilder::default().build_from_dir(dir.path());
    let index = ReverseIndex::from_graph(&graph);

    let leaf = exact().resolve("reporting.v", &graph);
    assert_eq!(leaf, BTreeSet::from([Identifier::new("reporting.v")]));
    let trees = render(&leaf, &graph);
    assert!(trees[0].is_leaf());
    assert_eq!(trees[0].to_text(), "reporting.v\n");
    assert_eq!(
        Resolution::classify(&Identifier::new("reporting.v"), &graph, &index),
        Resolution::Leaf
    );

    assert!(exact().resolve("reporting.missing", &graph).is_empty());
    assert_eq!(
        Resolution::classify(&Identifier::new("reporting.missing"), &graph, &index),
        Resolution::Unknown
    );
}

#[test]
fn suffix_mode_bridges_schema_qualification() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "daily.sql", "create view mart.daily as select * from \"SALES\".\"ORDERS\"");

    let graph = GraphBuilder::default().build_from_dir(dir.path());

    assert!(exact().resolve("orders", &graph).is_empty());

    let roots = suffix().resolve("orders", &graph);
    assert_eq!(roots, BTreeSet::from([Identifier::new("sales.orders")]));
    assert_eq!(render(&roots, &graph)[0].to_text(), "sales.orders\n└── mart.daily\n");
}

#[test]
fn ambiguous_suffix_renders_each_root() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.sql", "create view a as select * from sales.orders");
    write(dir.path(), "b.sql", "create view b as select * from archive.orders");

    let graph = GraphBuilder::default().build_from_dir(dir.path());
    let trees = render(&suffix().resolve("orders", &graph), &graph);

    let texts: Vec<String> = trees.iter().map(|t| t.to_text()).collect();
    assert_eq!(
        texts,
        vec!["archive.orders\n└── b\n".to_string(), "sales.orders\n└── a\n".to_string()]
    );
}

#[test]
fn cyclic_definitions_terminate() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.sql", "create view a as select * from b");
    write(dir.path(), "b.sql", "create view b as select * from a");

    let graph = GraphBuilder::default().build_from_dir(dir.path());
    let trees = render(&exact().resolve("a", &graph), &graph);

    assert_eq!(trees[0].to_text(), "a\n└── b\n    └── a (already shown)\n");
}

#[test]
fn conflicting_definitions_resolve_by_sorted_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a/orders_view.sql", "create view v as select * from old_source");
    write(dir.path(), "b/orders_view.sql", "create view v as select * from new_source");

    let mut files = FileScanner::new(dir.path()).scan();
    // Any input order gives the same winner
    files.reverse();
    let graph = GraphBuilder::default().build(files);

    assert_eq!(
        graph.definition_file("v"),
        Some(dir.path().join("b/orders_view.sql").as_path())
    );
    assert_eq!(graph.conflicts().len(), 1);
    assert_eq!(graph.conflicts()[0].previous, dir.path().join("a/orders_view.sql"));

    // Edges from both definitions are kept
    let deps: Vec<&str> = graph.dependencies_of("v").into_iter().map(Identifier::as_str).collect();
    assert_eq!(deps, vec!["new_source", "old_source"]);
}

#[test]
fn latin1_comment_keeps_definition() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("v.sql"),
        b"-- r\xe9sum\xe9 of orders\ncreate view v as select * from t",
    )
    .unwrap();
    fs::write(dir.path().join("binary.sql"), [0xff, 0xfe, 0x00, 0x63]).unwrap();

    let graph = GraphBuilder::default().build_from_dir(dir.path());

    assert_eq!(graph.definition_count(), 1);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.definition_file("v"), Some(dir.path().join("v.sql").as_path()));
    assert_eq!(graph.dependencies_of("v"), vec![&Identifier::new("t")]);
}

#[test]
fn missing_root_builds_empty_graph() {
    let graph = GraphBuilder::default().build_from_dir(Path::new("/no/such/sql/tree"));

    assert!(graph.is_empty());
    assert!(exact().resolve("anything", &graph).is_empty());
}

#[test]
fn every_captured_identifier_resolves_exactly() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "report.sql",
        "insert into ~mart~.Report select * from \"Raw\".\"Events\" e join dim.users u on u.id = e.user_id",
    );
    write(dir.path(), "users.sql", "create view dim.users as select * from raw.users");

    let graph = GraphBuilder::default().build_from_dir(dir.path());

    for object in graph.all_objects() {
        let found = exact().resolve(object.as_str(), &graph);
        assert_eq!(found, BTreeSet::from([object.clone()]));
    }
    for (from, to) in graph.edges() {
        assert_ne!(from, to);
    }
}

#[test]
fn config_controls_qualifier_stripping() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "v.sql", "create view v as select * from ~raw~.orders");

    let config = Config {
        strip_schema_qualifier: false,
        ..Config::default()
    };
    let builder = GraphBuilder::from_config(&config).unwrap();
    let graph = builder.build_from_dir(dir.path());

    let deps: Vec<&str> = graph.dependencies_of("v").into_iter().map(Identifier::as_str).collect();
    assert_eq!(deps, vec!["~raw~.orders"]);
}

#[test]
fn tree_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "v.sql", "create view v as select * from t");

    let graph = GraphBuilder::default().build_from_dir(dir.path());
    let trees = render(&exact().resolve("t", &graph), &graph);

    let json = serde_json::to_value(&trees).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "root": "t",
            "nodes": [
                { "name": "t", "depth": 0, "repeated": false },
                { "name": "v", "depth": 1, "repeated": false }
            ]
        }])
    );
}
