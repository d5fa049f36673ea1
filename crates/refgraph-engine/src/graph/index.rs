//! Direct-reference index.
//!
//! Holds every project of a run together with its ordered, deduplicated
//! direct references. Any referenced identifier that has no project entry is
//! materialized as an external, childless project, so every identifier that
//! appears in a reference list is also a key of the index.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use refgraph_core::project::{Project, ProjectId};
use refgraph_core::scan::Scan;
use tracing::debug;

static NO_OUTPUTS: BTreeSet<String> = BTreeSet::new();

/// Projects and their direct references, keyed by normalized identifier.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    projects: BTreeMap<ProjectId, Project>,
    direct: BTreeMap<ProjectId, Vec<ProjectId>>,
    root: Option<PathBuf>,
    solution_name: Option<String>,
}

impl ReferenceIndex {
    /// Build an index from projects and their declared references.
    ///
    /// Duplicate references keep their first occurrence. A project listed
    /// twice keeps its first entry.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (Project, Vec<ProjectId>)>) -> Self {
        let mut index = Self::default();
        for (project, references) in entries {
            let id = project.id.clone();
            if index.projects.contains_key(&id) {
                continue;
            }
            let mut seen = BTreeSet::new();
            let references: Vec<ProjectId> = references
                .into_iter()
                .filter(|r| seen.insert(r.clone()))
                .collect();
            index.projects.insert(id.clone(), project);
            index.direct.insert(id, references);
        }
        index.materialize_missing();
        index
    }

    /// Build an index from a metadata scan.
    #[must_use]
    pub fn from_scan(scan: Scan) -> Self {
        let Scan {
            root,
            solution_name,
            projects,
        } = scan;
        let mut index = Self::new(
            projects
                .into_values()
                .map(|scanned| (scanned.project, scanned.references)),
        );
        index.root = Some(root);
        index.solution_name = solution_name;
        index
    }

    /// Build an index from `(project, references)` name lists. Every listed
    /// project is internal; referenced names without an entry become
    /// external.
    #[must_use]
    pub fn from_edges(edges: &[(&str, &[&str])]) -> Self {
        Self::new(edges.iter().map(|(name, refs)| {
            (
                Project::new(*name, false),
                refs.iter().map(|r| ProjectId::new(r)).collect(),
            )
        }))
    }

    /// Set the directory relative paths are shown against.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the solution file name used for titles and page names.
    #[must_use]
    pub fn with_solution_name(mut self, name: impl Into<String>) -> Self {
        self.solution_name = Some(name.into());
        self
    }

    fn materialize_missing(&mut self) {
        let missing: BTreeSet<ProjectId> = self
            .direct
            .values()
            .flatten()
            .filter(|id| !self.projects.contains_key(*id))
            .cloned()
            .collect();
        for id in missing {
            debug!(project = %id, "reference target not indexed; adding as external leaf");
            let mut project = Project::new(id.as_str(), true);
            project.id = id.clone();
            self.projects.insert(id.clone(), project);
            self.direct.insert(id, Vec::new());
        }
    }

    /// Direct references of `id` in declaration order. Empty if unknown.
    #[must_use]
    pub fn direct_refs(&self, id: &ProjectId) -> &[ProjectId] {
        self.direct.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Output artifact names of `id`. Empty if unknown.
    #[must_use]
    pub fn outputs(&self, id: &ProjectId) -> &BTreeSet<String> {
        self.projects.get(id).map_or(&NO_OUTPUTS, |p| &p.outputs)
    }

    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    pub(crate) fn project_mut(&mut self, id: &ProjectId) -> Option<&mut Project> {
        self.projects.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ProjectId) -> bool {
        self.projects.contains_key(id)
    }

    /// Projects in identifier order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &ProjectId> {
        self.projects.keys()
    }

    /// `(dependent, dependency)` pairs in order.
    pub fn edges(&self) -> impl Iterator<Item = (&ProjectId, &ProjectId)> {
        self.direct
            .iter()
            .flat_map(|(from, refs)| refs.iter().map(move |to| (from, to)))
    }

    #[must_use]
    pub fn is_external(&self, id: &ProjectId) -> bool {
        self.projects.get(id).is_some_and(|p| p.is_external)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.direct.values().map(Vec::len).sum()
    }

    /// Directory relative paths are shown against.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Solution or filter file name the scan started from.
    #[must_use]
    pub fn solution_name(&self) -> Option<&str> {
        self.solution_name.as_deref()
    }
}
