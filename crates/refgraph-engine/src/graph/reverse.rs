//! Inverse relations of the closure and minimal maps.

use std::collections::{BTreeMap, BTreeSet};

use refgraph_core::project::ProjectId;
use tracing::instrument;

use crate::graph::closure::ClosureMap;
use crate::graph::reduce::MinimalMap;

static EMPTY: BTreeSet<ProjectId> = BTreeSet::new();

/// `full`: R → projects whose closure contains R (R included).
/// `minimal`: R → projects whose minimal set contains R.
#[derive(Debug, Clone, Default)]
pub struct ReverseMaps {
    full: BTreeMap<ProjectId, BTreeSet<ProjectId>>,
    minimal: BTreeMap<ProjectId, BTreeSet<ProjectId>>,
}

impl ReverseMaps {
    #[must_use]
    #[instrument(skip_all)]
    pub fn compute(closure: &ClosureMap, minimal: &MinimalMap) -> Self {
        let mut full: BTreeMap<ProjectId, BTreeSet<ProjectId>> = BTreeMap::new();
        let mut min: BTreeMap<ProjectId, BTreeSet<ProjectId>> = BTreeMap::new();

        for (project, set) in closure.iter() {
            min.entry(project.clone()).or_default();
            for dependency in set {
                full.entry(dependency.clone())
                    .or_default()
                    .insert(project.clone());
            }
        }

        for (project, refs) in minimal.iter() {
            for dependency in refs {
                min.entry(dependency.clone())
                    .or_default()
                    .insert(project.clone());
            }
        }

        Self { full, minimal: min }
    }

    /// Every project depending on `id`, directly or transitively.
    #[must_use]
    pub fn full_reverse_of(&self, id: &ProjectId) -> &BTreeSet<ProjectId> {
        self.full.get(id).unwrap_or(&EMPTY)
    }

    /// Projects listing `id` among their minimal references.
    #[must_use]
    pub fn minimal_reverse_of(&self, id: &ProjectId) -> &BTreeSet<ProjectId> {
        self.minimal.get(id).unwrap_or(&EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build::RawGraph;
    use crate::graph::index::ReferenceIndex;
    use crate::graph::reduce::ReductionMode;

    fn maps(edges: &[(&str, &[&str])]) -> ReverseMaps {
        let index = ReferenceIndex::from_edges(edges);
        let closure = ClosureMap::compute(&RawGraph::from_index(&index));
        let minimal = MinimalMap::compute(&index, &closure, ReductionMode::Full);
        ReverseMaps::compute(&closure, &minimal)
    }

    fn names(set: &BTreeSet<ProjectId>) -> Vec<&str> {
        set.iter().map(ProjectId::as_str).collect()
    }

    #[test]
    fn full_reverse_includes_self_and_transitive_dependents() {
        let maps = maps(&[("app", &["mid", "base"]), ("mid", &["base"])]);
        assert_eq!(names(maps.full_reverse_of(&ProjectId::new("base"))), vec!["app", "base", "mid"]);
        assert_eq!(names(maps.full_reverse_of(&ProjectId::new("app"))), vec!["app"]);
    }

    #[test]
    fn minimal_reverse_follows_reduced_edges() {
        let maps = maps(&[("app", &["mid", "base"]), ("mid", &["base"])]);
        assert_eq!(names(maps.minimal_reverse_of(&ProjectId::new("base"))), vec!["mid"]);
        assert_eq!(names(maps.minimal_reverse_of(&ProjectId::new("mid"))), vec!["app"]);
        assert!(maps.minimal_reverse_of(&ProjectId::new("app")).is_empty());
    }
}
