//! Transitive closure over the strongly-connected-component condensation.
//!
//! `tarjan_scc` yields components in postorder: every component appears
//! after all components it has edges into. Walking that order once, each
//! component's closure is its own members plus the closures of the
//! components it points to, and all members share it. The result is
//! complete on cyclic graphs and independent of traversal order.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::visit::EdgeRef;
use refgraph_core::project::ProjectId;
use tracing::{debug, instrument};

use crate::graph::build::RawGraph;

/// Project → every project it depends on, itself included.
#[derive(Debug, Clone, Default)]
pub struct ClosureMap {
    sets: BTreeMap<ProjectId, BTreeSet<ProjectId>>,
}

impl ClosureMap {
    #[must_use]
    #[instrument(skip(raw), fields(nodes = raw.node_count()))]
    pub fn compute(raw: &RawGraph) -> Self {
        let components = tarjan_scc(&raw.graph);

        let mut component_of = vec![0usize; raw.graph.node_count()];
        for (c, members) in components.iter().enumerate() {
            for node in members {
                component_of[node.index()] = c;
            }
        }

        let mut component_closure: Vec<BTreeSet<ProjectId>> = Vec::with_capacity(components.len());
        for (c, members) in components.iter().enumerate() {
            let mut set: BTreeSet<ProjectId> = members
                .iter()
                .filter_map(|node| raw.project_id(*node).cloned())
                .collect();
            for node in members {
                for edge in raw.graph.edges(*node) {
                    let target = component_of[edge.target().index()];
                    if target != c {
                        set.extend(component_closure[target].iter().cloned());
                    }
                }
            }
            component_closure.push(set);
        }

        let mut sets = BTreeMap::new();
        for (members, closure) in components.iter().zip(&component_closure) {
            for node in members {
                if let Some(id) = raw.project_id(*node) {
                    sets.insert(id.clone(), closure.clone());
                }
            }
        }

        debug!(components = components.len(), "computed closures");
        Self { sets }
    }

    /// Closure of `id`, or `None` for an unknown project.
    #[must_use]
    pub fn closure_of(&self, id: &ProjectId) -> Option<&BTreeSet<ProjectId>> {
        self.sets.get(id)
    }

    /// `true` when `to` is in the closure of `from`.
    #[must_use]
    pub fn reaches(&self, from: &ProjectId, to: &ProjectId) -> bool {
        self.sets.get(from).is_some_and(|set| set.contains(to))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProjectId, &BTreeSet<ProjectId>)> {
        self.sets.iter()
    }
}
