//! Reference cycle detection.
//!
//! Edges run `dependent → dependency`. A cycle is any strongly connected
//! component with more than one member, or a project that references itself.

#![allow(clippy::module_name_repetitions)]

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use refgraph_core::project::ProjectId;

/// Every reference cycle in `graph`, each sorted, the list sorted.
#[must_use]
pub fn find_all_cycles(graph: &DiGraph<ProjectId, ()>) -> Vec<Vec<ProjectId>> {
    let mut cycles: Vec<Vec<ProjectId>> = tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|node| has_self_loop(graph, *node))
        })
        .map(|component| {
            let mut ids: Vec<ProjectId> = component
                .into_iter()
                .filter_map(|idx| graph.node_weight(idx).cloned())
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

fn has_self_loop(graph: &DiGraph<ProjectId, ()>, node: NodeIndex) -> bool {
    graph.find_edge(node, node).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::RawGraph;
    use crate::graph::index::ReferenceIndex;

    fn cycles(edges: &[(&str, &[&str])]) -> Vec<Vec<String>> {
        let raw = RawGraph::from_index(&ReferenceIndex::from_edges(edges));
        find_all_cycles(&raw.graph)
            .into_iter()
            .map(|c| c.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        assert!(cycles(&[("a", &["b"]), ("b", &["c"])]).is_empty());
    }

    #[test]
    fn cycles_and_self_loops_are_reported_sorted() {
        let found = cycles(&[("z", &["y"]), ("y", &["z"]), ("s", &["s"]), ("a", &["z"])]);
        assert_eq!(found, vec![vec!["s".to_string()], vec!["y".to_string(), "z".to_string()]]);
    }
}
