//! petgraph view of the direct-reference graph.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A references B": edges run dependent → dependency,
//! the same way `ProjectReference` elements are declared. Renderers flip the
//! direction when drawing (dependency → dependent).
//!
//! ## Content Hash
//!
//! The graph carries a BLAKE3 hash of its sorted edge list. The hash is
//! stored with every dependency export so consumers can tell which snapshot
//! of the reference graph a row came from.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use refgraph_core::project::ProjectId;
use tracing::instrument;

use crate::graph::index::ReferenceIndex;

/// Directed reference graph. Nodes are project identifiers.
#[derive(Debug, Clone)]
pub struct RawGraph {
    pub graph: DiGraph<ProjectId, ()>,
    pub node_map: HashMap<ProjectId, NodeIndex>,
    /// `blake3:<hex>` hash of the edge set.
    pub content_hash: String,
}

impl RawGraph {
    /// Build the graph for every project of `index`.
    ///
    /// Nodes are added in identifier order, so node indices are stable for
    /// identical input.
    #[must_use]
    #[instrument(skip(index), fields(projects = index.len()))]
    pub fn from_index(index: &ReferenceIndex) -> Self {
        let mut graph = DiGraph::<ProjectId, ()>::with_capacity(index.len(), index.edge_count());
        let mut node_map: HashMap<ProjectId, NodeIndex> = HashMap::with_capacity(index.len());

        for id in index.ids() {
            let idx = graph.add_node(id.clone());
            node_map.insert(id.clone(), idx);
        }

        let mut edges: Vec<(&ProjectId, &ProjectId)> = index.edges().collect();
        edges.sort_unstable();
        let content_hash = compute_edge_hash(&edges);

        for (from, to) in edges {
            let from_idx = *node_map
                .entry(from.clone())
                .or_insert_with(|| graph.add_node(from.clone()));
            let to_idx = *node_map
                .entry(to.clone())
                .or_insert_with(|| graph.add_node(to.clone()));
            if !graph.contains_edge(from_idx, to_idx) {
                graph.add_edge(from_idx, to_idx, ());
            }
        }

        Self {
            graph,
            node_map,
            content_hash,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn node_index(&self, id: &ProjectId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    #[must_use]
    pub fn project_id(&self, idx: NodeIndex) -> Option<&ProjectId> {
        self.graph.node_weight(idx)
    }
}

fn compute_edge_hash(edges: &[(&ProjectId, &ProjectId)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (from, to) in edges {
        hasher.update(from.as_str().as_bytes());
        hasher.update(b"\x00");
        hasher.update(to.as_str().as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}
