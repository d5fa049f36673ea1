//! Per-project transitive reduction of direct references.
//!
//! A direct reference `r` of `owner` is redundant when some other reference
//! `r'` strictly dominates it:
//!
//! - `r` is in the closure of `r'`,
//! - `r'` is not in the closure of `r` (members of one cycle never remove
//!   each other).
//!
//! Self-references are dropped. Because strict domination is a partial
//! order, every removed reference is reachable from a kept one, so the kept
//! set reproduces the owner's full closure.

use std::collections::{BTreeMap, BTreeSet};

use refgraph_core::project::ProjectId;
use tracing::instrument;

use crate::graph::closure::ClosureMap;
use crate::graph::index::ReferenceIndex;

/// Which references take part in the reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReductionMode {
    /// Reduce the declared references as they are.
    #[default]
    Full,
    /// Replace external references by their nearest internal descendants
    /// first, then reduce.
    InternalOnly,
}

/// Project → minimal subset of its references, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct MinimalMap {
    refs: BTreeMap<ProjectId, Vec<ProjectId>>,
}

impl MinimalMap {
    #[must_use]
    #[instrument(skip(index, closure))]
    pub fn compute(index: &ReferenceIndex, closure: &ClosureMap, mode: ReductionMode) -> Self {
        let refs = index
            .ids()
            .map(|owner| {
                let candidates = match mode {
                    ReductionMode::Full => index.direct_refs(owner).to_vec(),
                    ReductionMode::InternalOnly => internal_projection(index, owner),
                };
                (owner.clone(), reduce(owner, &candidates, closure))
            })
            .collect();
        Self { refs }
    }

    /// Minimal references of `id`. Empty if unknown.
    #[must_use]
    pub fn minimal_refs_of(&self, id: &ProjectId) -> &[ProjectId] {
        self.refs.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProjectId, &[ProjectId])> {
        self.refs.iter().map(|(id, refs)| (id, refs.as_slice()))
    }

    /// Total number of minimal edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.refs.values().map(Vec::len).sum()
    }
}

/// Drop every reference strictly dominated by another one.
#[must_use]
pub fn reduce(owner: &ProjectId, refs: &[ProjectId], closure: &ClosureMap) -> Vec<ProjectId> {
    let candidates: Vec<&ProjectId> = refs.iter().filter(|r| *r != owner).collect();

    candidates
        .iter()
        .filter(|r| {
            !candidates
                .iter()
                .any(|other| other != *r && dominates(other, r, closure))
        })
        .map(|r| (*r).clone())
        .collect()
}

fn dominates(other: &ProjectId, r: &ProjectId, closure: &ClosureMap) -> bool {
    closure.reaches(other, r) && !closure.reaches(r, other)
}

/// References of `owner` with each external reference replaced by the
/// internal projects it leads to. Externals reached twice are expanded once.
fn internal_projection(index: &ReferenceIndex, owner: &ProjectId) -> Vec<ProjectId> {
    let mut projected = Vec::new();
    let mut emitted = BTreeSet::new();
    let mut expanded = BTreeSet::new();
    let mut stack: Vec<&ProjectId> = index.direct_refs(owner).iter().rev().collect();

    while let Some(next) = stack.pop() {
        if index.is_external(next) {
            if expanded.insert(next) {
                stack.extend(index.direct_refs(next).iter().rev());
            }
        } else if next != owner && emitted.insert(next) {
            projected.push(next.clone());
        }
    }
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::RawGraph;
    use refgraph_core::project::Project;

    fn id(name: &str) -> ProjectId {
        ProjectId::new(name)
    }

    fn names(refs: &[ProjectId]) -> Vec<&str> {
        refs.iter().map(ProjectId::as_str).collect()
    }

    fn minimal(index: &ReferenceIndex, mode: ReductionMode) -> MinimalMap {
        let closure = ClosureMap::compute(&RawGraph::from_index(index));
        MinimalMap::compute(index, &closure, mode)
    }

    #[test]
    fn implied_reference_is_removed() {
        let index = ReferenceIndex::from_edges(&[("app", &["mid", "base"]), ("mid", &["base"])]);
        let map = minimal(&index, ReductionMode::Full);
        assert_eq!(names(map.minimal_refs_of(&id("app"))), vec!["mid"]);
        assert_eq!(names(map.minimal_refs_of(&id("mid"))), vec!["base"]);
    }

    #[test]
    fn mutual_references_are_both_kept() {
        let index = ReferenceIndex::from_edges(&[("p", &["a", "b"]), ("a", &["b"]), ("b", &["a"])]);
        let map = minimal(&index, ReductionMode::Full);
        assert_eq!(names(map.minimal_refs_of(&id("p"))), vec!["a", "b"]);
    }

    #[test]
    fn mutual_pair_reachable_from_third_reference_is_removed() {
        let index = ReferenceIndex::from_edges(&[
            ("p", &["a", "b", "c"]),
            ("a", &["b"]),
            ("b", &["a"]),
            ("c", &["a"]),
        ]);
        let map = minimal(&index, ReductionMode::Full);
        assert_eq!(names(map.minimal_refs_of(&id("p"))), vec!["c"]);
    }

    #[test]
    fn reference_on_cycle_through_owner_still_removes_implied_ones() {
        // b reaches p and c; c is implied by b.
        let index = ReferenceIndex::from_edges(&[("p", &["b", "c"]), ("b", &["p", "c"])]);
        let map = minimal(&index, ReductionMode::Full);
        assert_eq!(names(map.minimal_refs_of(&id("p"))), vec!["b"]);
        assert_eq!(names(map.minimal_refs_of(&id("b"))), vec!["p"]);
    }

    #[test]
    fn self_reference_is_dropped() {
        let index = ReferenceIndex::from_edges(&[("a", &["a", "b"])]);
        let map = minimal(&index, ReductionMode::Full);
        assert_eq!(names(map.minimal_refs_of(&id("a"))), vec!["b"]);
    }

    #[test]
    fn internal_only_substitutes_external_references() {
        // app → ext (external) → core; app → util; core → util.
        let index = ReferenceIndex::new([
            (Project::new("app", false), vec![id("ext"), id("util")]),
            (Project::new("ext", true), vec![id("core"), id("ext2")]),
            (Project::new("ext2", true), vec![id("ext")]),
            (Project::new("core", false), vec![id("util")]),
            (Project::new("util", false), vec![]),
        ]);
        let map = minimal(&index, ReductionMode::InternalOnly);
        assert_eq!(names(map.minimal_refs_of(&id("app"))), vec!["core"]);

        let full = minimal(&index, ReductionMode::Full);
        assert_eq!(names(full.minimal_refs_of(&id("app"))), vec!["ext"]);
    }

    #[test]
    fn unknown_project_has_no_minimal_refs() {
        let map = MinimalMap::default();
        assert!(map.minimal_refs_of(&id("nope")).is_empty());
        assert_eq!(map.edge_count(), 0);
    }
}
