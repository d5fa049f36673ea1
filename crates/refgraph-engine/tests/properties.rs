//! Property tests for closures, reduction and reverse maps.

use std::collections::BTreeSet;

use proptest::prelude::*;
use refgraph_core::project::{Project, ProjectId};
use refgraph_engine::{DependencyGraph, GraphOptions, ReferenceIndex};

fn name(i: usize) -> ProjectId {
    ProjectId::new(&format!("p{i:02}"))
}

fn graph_from(n: usize, edges: &[(usize, usize)]) -> DependencyGraph {
    let index = ReferenceIndex::new((0..n).map(|i| {
        let refs = edges
            .iter()
            .filter(|(from, _)| *from == i)
            .map(|(_, to)| name(*to))
            .collect();
        (Project::new(name(i).as_str(), false), refs)
    }));
    DependencyGraph::build(index, GraphOptions::default())
}

/// Any directed graph, cycles and self-references included.
fn arb_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..n * 3)))
}

/// Acyclic graphs: edges only run from lower to higher index.
fn arb_dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    arb_graph().prop_map(|(n, edges)| {
        let edges = edges
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        (n, edges)
    })
}

fn union_of_minimal(graph: &DependencyGraph, p: &ProjectId, skip: Option<&ProjectId>) -> BTreeSet<ProjectId> {
    let mut union = BTreeSet::from([p.clone()]);
    for r in graph.minimal_refs_of(p) {
        if Some(r) != skip {
            union.extend(graph.closure_of(r).iter().cloned());
        }
    }
    union
}

proptest! {
    #[test]
    fn closure_contains_self((n, edges) in arb_graph()) {
        let graph = graph_from(n, &edges);
        for i in 0..n {
            prop_assert!(graph.closure_of(&name(i)).contains(&name(i)));
        }
    }

    #[test]
    fn closure_is_monotone_along_references((n, edges) in arb_graph()) {
        let graph = graph_from(n, &edges);
        for (from, to) in &edges {
            prop_assert!(graph.closure_of(&name(*to)).is_subset(graph.closure_of(&name(*from))));
        }
    }

    #[test]
    fn minimal_references_reproduce_closure((n, edges) in arb_graph()) {
        let graph = graph_from(n, &edges);
        for i in 0..n {
            let p = name(i);
            prop_assert_eq!(&union_of_minimal(&graph, &p, None), graph.closure_of(&p));
        }
    }

    #[test]
    fn minimal_references_are_minimal_on_dags((n, edges) in arb_dag()) {
        let graph = graph_from(n, &edges);
        for i in 0..n {
            let p = name(i);
            let full = graph.closure_of(&p);
            for r in graph.minimal_refs_of(&p) {
                let without = union_of_minimal(&graph, &p, Some(r));
                prop_assert!(without.len() < full.len(), "{} still implied for {}", r, p);
            }
        }
    }

    #[test]
    fn minimal_references_are_minimal_outside_mutual_pairs((n, edges) in arb_graph()) {
        let graph = graph_from(n, &edges);
        for i in 0..n {
            let p = name(i);
            let full = graph.closure_of(&p);
            let kept = graph.minimal_refs_of(&p);
            for r in kept {
                let mutual = kept.iter().any(|other| {
                    other != r
                        && graph.closure_of(r).contains(other)
                        && graph.closure_of(other).contains(r)
                });
                if mutual {
                    continue;
                }
                let without = union_of_minimal(&graph, &p, Some(r));
                prop_assert!(without.len() < full.len(), "{} still implied for {}", r, p);
            }
        }
    }

    #[test]
    fn full_reverse_inverts_closure((n, edges) in arb_graph()) {
        let graph = graph_from(n, &edges);
        for i in 0..n {
            for j in 0..n {
                let (p, r) = (name(i), name(j));
                prop_assert_eq!(
                    graph.closure_of(&p).contains(&r),
                    graph.full_reverse_of(&r).contains(&p)
                );
            }
        }
    }
}
