//! Known-topology scenario tests.
//!
//! Each test builds a small hand-crafted solution and checks the derived
//! relations against values worked out by hand.

use std::collections::BTreeSet;

use refgraph_core::buildlog::BuildFact;
use refgraph_core::project::{Project, ProjectId};
use refgraph_engine::view::{RootQuery, ViewDirection};
use refgraph_engine::{DependencyGraph, GraphOptions, ReferenceIndex};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn id(name: &str) -> ProjectId {
    ProjectId::new(name)
}

fn set(names: &[&str]) -> BTreeSet<ProjectId> {
    names.iter().map(|n| id(n)).collect()
}

fn build(edges: &[(&str, &[&str])]) -> DependencyGraph {
    DependencyGraph::build(ReferenceIndex::from_edges(edges), GraphOptions::default())
}

fn timed(sequence: u32, name: &str, duration_ms: u64) -> BuildFact {
    BuildFact {
        sequence,
        name: name.to_string(),
        duration_ms,
        compile_ms: None,
        link_ms: None,
        unused_refs: None,
    }
}

// ---------------------------------------------------------------------------
// Reduction and closure
// ---------------------------------------------------------------------------

#[test]
fn implied_reference_is_reduced_away() {
    let graph = build(&[("App", &["Mid", "Base"]), ("Mid", &["Base"]), ("Base", &[])]);
    assert_eq!(graph.minimal_refs_of(&id("app")), &[id("mid")]);
    assert_eq!(graph.closure_of(&id("app")), &set(&["app", "mid", "base"]));
}

#[test]
fn mutual_references_terminate_with_shared_closure() {
    let graph = build(&[("A", &["B"]), ("B", &["A"])]);
    assert_eq!(graph.closure_of(&id("a")), &set(&["a", "b"]));
    assert_eq!(graph.closure_of(&id("b")), &set(&["a", "b"]));
}

#[test]
fn three_node_cycles_close_completely_in_any_declaration_order() {
    let orders: [&[(&str, &[&str])]; 3] = [
        &[("a", &["b"]), ("b", &["c"]), ("c", &["a"])],
        &[("c", &["a"]), ("a", &["b"]), ("b", &["c"])],
        &[("b", &["c"]), ("c", &["a"]), ("a", &["b"])],
    ];
    for edges in orders {
        let graph = build(edges);
        for name in ["a", "b", "c"] {
            assert_eq!(graph.closure_of(&id(name)), &set(&["a", "b", "c"]), "{name}");
        }
    }
}

#[test]
fn entry_into_cycle_reaches_every_member() {
    let graph = build(&[("app", &["x"]), ("x", &["y"]), ("y", &["z"]), ("z", &["x"])]);
    assert_eq!(graph.closure_of(&id("app")), &set(&["app", "x", "y", "z"]));
    assert_eq!(graph.full_reverse_of(&id("z")), &set(&["app", "x", "y", "z"]));
}

#[test]
fn internal_only_mode_routes_through_externals() {
    let index = ReferenceIndex::new([
        (Project::new("app", false), vec![id("sdk"), id("core")]),
        (Project::new("sdk", true), vec![id("core")]),
        (Project::new("core", false), vec![]),
    ]);
    let graph = DependencyGraph::build(index, GraphOptions { internal_only: true });
    assert_eq!(graph.minimal_refs_of(&id("app")), &[id("core")]);
    let all = graph.select_all(false);
    assert!(!all.nodes.contains(&id("sdk")));
}

// ---------------------------------------------------------------------------
// Ranking and views
// ---------------------------------------------------------------------------

#[test]
fn duration_ranking_takes_longest_first() {
    let graph = DependencyGraph::build_with_timing(
        ReferenceIndex::from_edges(&[("X", &[]), ("Y", &[]), ("Z", &[])]),
        GraphOptions::default(),
        &[timed(1, "X", 500), timed(2, "Y", 300), timed(3, "Z", 900)],
    );
    let ranked: Vec<ProjectId> = graph.rank_by_duration(2).into_iter().map(|e| e.id).collect();
    assert_eq!(ranked, vec![id("z"), id("x")]);
    assert_eq!(graph.max_duration_ms(), 900);
}

#[test]
fn neighborhood_shows_minimal_neighbors_only() {
    let graph = build(&[("M", &["N"]), ("P", &["M"]), ("N", &[])]);
    let view = graph
        .select_for_root(&RootQuery::Name("m".into()), ViewDirection::Neighborhood)
        .expect("unique root");
    assert_eq!(view.nodes, set(&["m", "n", "p"]));
    let edges: Vec<(&str, &str)> = view
        .edges
        .iter()
        .map(|e| (e.dependency.as_str(), e.dependent.as_str()))
        .collect();
    assert_eq!(edges, vec![("n", "m"), ("m", "p")]);
}

#[test]
fn unused_reference_is_flagged_from_build_log_text() {
    let mut dep = Project::new("Dep", false);
    dep.outputs.insert("dep.lib".to_string());
    let index = ReferenceIndex::new([
        (Project::new("Consumer", false), vec![id("dep")]),
        (dep, vec![]),
    ]);
    let graph = DependencyGraph::build_with_timing(
        index,
        GraphOptions::default(),
        &[BuildFact {
            unused_refs: Some("Unused libraries:\n  C:\\out\\dep.lib\n".to_string()),
            ..timed(4, "Consumer", 10)
        }],
    );
    let view = graph.select_all(false);
    assert_eq!(view.edges.len(), 1);
    assert_eq!(view.edges[0].dependency, id("dep"));
    assert!(view.edges[0].unused);
}

#[test]
fn aliases_are_stable_for_identical_input() {
    let edges: &[(&str, &[&str])] = &[("b", &["a"]), ("c", &["a", "b"]), ("a", &[])];
    let first = build(edges);
    let second = build(edges);
    for name in ["a", "b", "c"] {
        assert_eq!(first.aliases().alias_of(&id(name)), second.aliases().alias_of(&id(name)));
    }
    assert_eq!(first.aliases().alias_of(&id("a")), Some(0));
    assert_eq!(first.content_hash(), second.content_hash());
}
