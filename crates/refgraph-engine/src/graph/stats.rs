//! Summary statistics for a dependency graph.
//!
//! # Statistics Provided
//!
//! - **project_count**: every project, internal and external.
//! - **direct_edge_count** / **minimal_edge_count**: declared references and
//!   the references left after transitive reduction.
//! - **density**: `direct_edge_count / (n * (n - 1))`; zero for fewer than
//!   two projects.
//! - **cycle_count**: reference cycles (SCCs with more than one member, or
//!   self-references).
//! - **weakly_connected_component_count**: disjoint sub-solutions.
//! - **max_in_degree** / **max_out_degree**: most direct dependents / most
//!   direct references on one project.

use petgraph::Direction;
use petgraph::algo::connected_components;
use petgraph::visit::IntoNodeIdentifiers;
use serde::Serialize;

use crate::engine::DependencyGraph;
use crate::graph::cycles::find_all_cycles;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub project_count: usize,
    pub internal_count: usize,
    pub external_count: usize,
    pub direct_edge_count: usize,
    pub minimal_edge_count: usize,
    pub density: f64,
    pub cycle_count: usize,
    pub weakly_connected_component_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
    /// Projects with attached build timing.
    pub timed_count: usize,
    pub max_duration_ms: u64,
    /// BLAKE3 hash of the direct edge set.
    pub content_hash: String,
}

impl GraphStats {
    #[must_use]
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let raw = graph.raw();
        let index = graph.index();
        let external_count = index.projects().filter(|p| p.is_external).count();
        let degree = |direction: Direction| {
            raw.graph
                .node_identifiers()
                .map(|idx| raw.graph.neighbors_directed(idx, direction).count())
                .max()
                .unwrap_or(0)
        };

        Self {
            project_count: index.len(),
            internal_count: index.len() - external_count,
            external_count,
            direct_edge_count: raw.edge_count(),
            minimal_edge_count: graph.minimal_edge_count(),
            density: compute_density(raw.node_count(), raw.edge_count()),
            cycle_count: find_all_cycles(&raw.graph).len(),
            weakly_connected_component_count: connected_components(&raw.graph),
            max_in_degree: degree(Direction::Incoming),
            max_out_degree: degree(Direction::Outgoing),
            timed_count: graph.timing().attached,
            max_duration_ms: graph.max_duration_ms(),
            content_hash: graph.content_hash().to_string(),
        }
    }

    #[must_use]
    pub const fn has_cycles(&self) -> bool {
        self.cycle_count > 0
    }

    /// Share of direct references removed by the reduction.
    #[must_use]
    pub fn reduction_ratio(&self) -> f64 {
        compute_ratio(self.direct_edge_count, self.minimal_edge_count)
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0_f64;
    }
    let max_edges = (node_count * (node_count - 1)) as f64;
    edge_count as f64 / max_edges
}

#[allow(clippy::cast_precision_loss)]
fn compute_ratio(raw: usize, reduced: usize) -> f64 {
    if raw == 0 {
        return 0.0_f64;
    }
    let removed = (raw as f64 - reduced as f64).max(0.0_f64);
    removed / raw as f64
}
