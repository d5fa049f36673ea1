//! The assembled dependency graph of one run.
//!
//! [`DependencyGraph::build`] runs every construction stage once, in order:
//! timing attachment, petgraph construction, closures, reduction, reverse
//! maps and aliases. The result is immutable; views and renderers only read
//! it, so one graph can serve many parallel render requests.

use std::collections::BTreeSet;

use refgraph_core::buildlog::BuildFact;
use refgraph_core::error::ErrorCode;
use refgraph_core::project::{Project, ProjectId};
use tracing::{info, instrument};

use crate::graph::build::RawGraph;
use crate::graph::closure::ClosureMap;
use crate::graph::index::ReferenceIndex;
use crate::graph::reduce::{MinimalMap, ReductionMode};
use crate::graph::reverse::ReverseMaps;
use crate::timing::{self, SubstringMatcher, TimingReport, UnusedReferenceMatcher};
use crate::view::alias::AliasTable;

static EMPTY: BTreeSet<ProjectId> = BTreeSet::new();

/// Construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    /// Reduce over internal projects only and leave externals out of views.
    pub internal_only: bool,
}

/// Errors raised when a view cannot be selected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectError {
    #[error("no projects found matching root project name \"{0}\"")]
    RootNotFound(String),

    #[error("no project has alias {0}")]
    UnknownAlias(u32),

    #[error("root project name \"{query}\" is ambiguous, found multiple matches: {}", format_matches(.matches))]
    RootAmbiguous {
        query: String,
        matches: Vec<ProjectId>,
    },
}

impl SelectError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::RootNotFound(_) | Self::UnknownAlias(_) => ErrorCode::RootNotFound,
            Self::RootAmbiguous { .. } => ErrorCode::RootAmbiguous,
        }
    }
}

fn format_matches(matches: &[ProjectId]) -> String {
    matches
        .iter()
        .map(ProjectId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Immutable dependency graph with every derived relation.
pub struct DependencyGraph {
    index: ReferenceIndex,
    raw: RawGraph,
    closure: ClosureMap,
    minimal: MinimalMap,
    reverse: ReverseMaps,
    aliases: AliasTable,
    timing: TimingReport,
    options: GraphOptions,
    matcher: Box<dyn UnusedReferenceMatcher>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("projects", &self.index.len())
            .field("direct_edges", &self.index.edge_count())
            .field("minimal_edges", &self.minimal.edge_count())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl DependencyGraph {
    /// Build without timing facts.
    #[must_use]
    pub fn build(index: ReferenceIndex, options: GraphOptions) -> Self {
        Self::build_with_timing(index, options, &[])
    }

    /// Build, attaching `facts` to their projects first.
    #[must_use]
    #[instrument(skip_all, fields(projects = index.len(), facts = facts.len()))]
    pub fn build_with_timing(
        mut index: ReferenceIndex,
        options: GraphOptions,
        facts: &[BuildFact],
    ) -> Self {
        let timing = timing::attach(&mut index, facts);
        let raw = RawGraph::from_index(&index);
        let closure = ClosureMap::compute(&raw);
        let mode = if options.internal_only {
            ReductionMode::InternalOnly
        } else {
            ReductionMode::Full
        };
        let minimal = MinimalMap::compute(&index, &closure, mode);
        let reverse = ReverseMaps::compute(&closure, &minimal);
        let aliases = AliasTable::new(index.ids());

        info!(
            projects = index.len(),
            direct_edges = index.edge_count(),
            minimal_edges = minimal.edge_count(),
            timed = timing.attached,
            "dependency graph built"
        );

        Self {
            index,
            raw,
            closure,
            minimal,
            reverse,
            aliases,
            timing,
            options,
            matcher: Box::new(SubstringMatcher),
        }
    }

    /// Replace the unused-reference heuristic.
    #[must_use]
    pub fn with_matcher(mut self, matcher: impl UnusedReferenceMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    #[must_use]
    pub const fn index(&self) -> &ReferenceIndex {
        &self.index
    }

    #[must_use]
    pub const fn raw(&self) -> &RawGraph {
        &self.raw
    }

    #[must_use]
    pub const fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    #[must_use]
    pub const fn timing(&self) -> &TimingReport {
        &self.timing
    }

    #[must_use]
    pub const fn options(&self) -> GraphOptions {
        self.options
    }

    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.index.project(id)
    }

    /// Largest attached build duration (0 without timing).
    #[must_use]
    pub const fn max_duration_ms(&self) -> u64 {
        self.timing.max_duration_ms
    }

    /// Content hash of the direct edge set.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.raw.content_hash
    }

    /// Every project `id` depends on, itself included. Empty if unknown.
    #[must_use]
    pub fn closure_of(&self, id: &ProjectId) -> &BTreeSet<ProjectId> {
        self.closure.closure_of(id).unwrap_or(&EMPTY)
    }

    #[must_use]
    pub fn minimal_refs_of(&self, id: &ProjectId) -> &[ProjectId] {
        self.minimal.minimal_refs_of(id)
    }

    #[must_use]
    pub fn full_reverse_of(&self, id: &ProjectId) -> &BTreeSet<ProjectId> {
        self.reverse.full_reverse_of(id)
    }

    #[must_use]
    pub fn minimal_reverse_of(&self, id: &ProjectId) -> &BTreeSet<ProjectId> {
        self.reverse.minimal_reverse_of(id)
    }

    /// Number of minimal edges.
    #[must_use]
    pub fn minimal_edge_count(&self) -> usize {
        self.minimal.edge_count()
    }

    /// `dependent` references `dependency` but never links against it.
    #[must_use]
    pub fn is_unused_edge(&self, dependency: &ProjectId, dependent: &ProjectId) -> bool {
        match (self.index.project(dependency), self.index.project(dependent)) {
            (Some(dep), Some(consumer)) => self.matcher.is_unused(dep, consumer),
            _ => false,
        }
    }

    /// Projects a view may show: all of them, or internal ones only.
    pub fn visible_projects(&self, hide_external: bool) -> impl Iterator<Item = &Project> {
        self.index
            .projects()
            .filter(move |p| !(hide_external && p.is_external))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ProjectId {
        ProjectId::new(name)
    }

    #[test]
    fn scenario_minimal_reference_and_closure() {
        let graph = DependencyGraph::build(
            ReferenceIndex::from_edges(&[("App", &["Mid", "Base"]), ("Mid", &["Base"]), ("Base", &[])]),
            GraphOptions::default(),
        );
        assert_eq!(graph.minimal_refs_of(&id("app")), &[id("mid")]);
        let closure: Vec<&str> = graph.closure_of(&id("app")).iter().map(ProjectId::as_str).collect();
        assert_eq!(closure, vec!["app", "base", "mid"]);
    }

    #[test]
    fn unknown_ids_yield_empty_relations() {
        let graph = DependencyGraph::build(ReferenceIndex::default(), GraphOptions::default());
        assert!(graph.closure_of(&id("x")).is_empty());
        assert!(graph.minimal_refs_of(&id("x")).is_empty());
        assert!(graph.full_reverse_of(&id("x")).is_empty());
        assert!(graph.minimal_reverse_of(&id("x")).is_empty());
    }

    #[test]
    fn custom_matcher_replaces_default() {
        struct Always;
        impl UnusedReferenceMatcher for Always {
            fn is_unused(&self, _: &Project, _: &Project) -> bool {
                true
            }
        }
        let graph = DependencyGraph::build(
            ReferenceIndex::from_edges(&[("a", &["b"]), ("b", &[])]),
            GraphOptions::default(),
        );
        assert!(!graph.is_unused_edge(&id("b"), &id("a")));
        let graph = graph.with_matcher(Always);
        assert!(graph.is_unused_edge(&id("b"), &id("a")));
    }

    #[test]
    fn select_errors_map_to_codes() {
        assert_eq!(SelectError::RootNotFound("x".into()).code(), ErrorCode::RootNotFound);
        assert_eq!(SelectError::UnknownAlias(3).code(), ErrorCode::RootNotFound);
        let ambiguous = SelectError::RootAmbiguous {
            query: "core".into(),
            matches: vec![id("a/core"), id("b/core")],
        };
        assert_eq!(ambiguous.code(), ErrorCode::RootAmbiguous);
        assert!(ambiguous.to_string().contains("a/core, b/core"));
    }
}
