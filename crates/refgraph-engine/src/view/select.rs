//! Sub-graph selection.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use refgraph_core::project::ProjectId;
use serde::Serialize;
use tracing::debug;

use crate::engine::{DependencyGraph, SelectError};

/// How a root query names its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootQuery {
    /// Case-insensitive substring of the normalized identifier.
    Name(String),
    /// Per-run integer alias.
    Alias(u32),
}

/// Which side of the root a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewDirection {
    /// Everything the root depends on.
    Up,
    /// Everything that depends on the root.
    Down,
    /// The root, its minimal references and its minimal dependents.
    Neighborhood,
}

impl ViewDirection {
    /// File name suffix of a per-project page.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Neighborhood => "",
        }
    }
}

impl fmt::Display for ViewDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Neighborhood => "neighborhood",
        })
    }
}

impl FromStr for ViewDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "upstream" => Ok(Self::Up),
            "down" | "downstream" => Ok(Self::Down),
            "" | "neighborhood" | "both" => Ok(Self::Neighborhood),
            other => Err(format!("unknown direction '{other}' (expected up, down or neighborhood)")),
        }
    }
}

/// A minimal-reference edge inside a selection, drawn dependency → dependent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedEdge {
    pub dependency: ProjectId,
    pub dependent: ProjectId,
    pub unused: bool,
}

/// Nodes and edges of one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub root: Option<ProjectId>,
    pub direction: Option<ViewDirection>,
    pub nodes: BTreeSet<ProjectId>,
    pub edges: Vec<SelectedEdge>,
}

impl DependencyGraph {
    /// Resolve a root query to one project.
    ///
    /// # Errors
    ///
    /// [`SelectError::RootNotFound`] / [`SelectError::UnknownAlias`] when
    /// nothing matches, [`SelectError::RootAmbiguous`] when a name matches
    /// several projects.
    pub fn find_root(&self, query: &RootQuery) -> Result<ProjectId, SelectError> {
        match query {
            RootQuery::Alias(alias) => self
                .aliases()
                .project_of(*alias)
                .cloned()
                .ok_or(SelectError::UnknownAlias(*alias)),
            RootQuery::Name(name) => {
                let matches: Vec<ProjectId> = self
                    .visible_projects(self.options().internal_only)
                    .filter(|p| p.id.matches_fragment(name))
                    .map(|p| p.id.clone())
                    .collect();
                if matches.len() > 1 {
                    return Err(SelectError::RootAmbiguous {
                        query: name.clone(),
                        matches,
                    });
                }
                matches
                    .into_iter()
                    .next()
                    .ok_or_else(|| SelectError::RootNotFound(name.clone()))
            }
        }
    }

    /// Select the view of `query` in `direction`.
    ///
    /// # Errors
    ///
    /// Propagates root lookup failures from [`Self::find_root`].
    pub fn select_for_root(
        &self,
        query: &RootQuery,
        direction: ViewDirection,
    ) -> Result<Selection, SelectError> {
        let root = self.find_root(query)?;
        Ok(self.select_around(&root, direction))
    }

    /// Select the view of a known project.
    #[must_use]
    pub fn select_around(&self, root: &ProjectId, direction: ViewDirection) -> Selection {
        let mut nodes: BTreeSet<ProjectId> = match direction {
            ViewDirection::Up => self.closure_of(root).clone(),
            ViewDirection::Down => self.full_reverse_of(root).clone(),
            ViewDirection::Neighborhood => {
                let mut set: BTreeSet<ProjectId> =
                    self.minimal_refs_of(root).iter().cloned().collect();
                set.extend(self.minimal_reverse_of(root).iter().cloned());
                set.insert(root.clone());
                set
            }
        };
        if self.options().internal_only {
            nodes.retain(|id| !self.index().is_external(id));
        }

        debug!(root = %root, %direction, nodes = nodes.len(), "selected view");
        let edges = self.edges_within(&nodes);
        Selection {
            root: Some(root.clone()),
            direction: Some(direction),
            nodes,
            edges,
        }
    }

    /// Select every project, optionally leaving externals out.
    #[must_use]
    pub fn select_all(&self, hide_external: bool) -> Selection {
        let hide = hide_external || self.options().internal_only;
        let nodes: BTreeSet<ProjectId> = self.visible_projects(hide).map(|p| p.id.clone()).collect();
        let edges = self.edges_within(&nodes);
        Selection {
            root: None,
            direction: None,
            nodes,
            edges,
        }
    }

    /// Minimal edges with both ends in `nodes`, dependents in order, each
    /// dependent's references sorted.
    fn edges_within(&self, nodes: &BTreeSet<ProjectId>) -> Vec<SelectedEdge> {
        let mut edges = Vec::new();
        for dependent in nodes {
            let mut refs: Vec<&ProjectId> = self
                .minimal_refs_of(dependent)
                .iter()
                .filter(|r| nodes.contains(*r))
                .collect();
            refs.sort_unstable();
            for dependency in refs {
                edges.push(SelectedEdge {
                    dependency: dependency.clone(),
                    dependent: dependent.clone(),
                    unused: self.is_unused_edge(dependency, dependent),
                });
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphOptions;
    use crate::graph::index::ReferenceIndex;
    use refgraph_core::project::Project;

    fn id(name: &str) -> ProjectId {
        ProjectId::new(name)
    }

    fn graph() -> DependencyGraph {
        DependencyGraph::build(
            ReferenceIndex::from_edges(&[
                ("src/app/app", &["src/mid/mid", "src/base/base"]),
                ("src/mid/mid", &["src/base/base", "ext/zlib"]),
                ("src/base/base", &[]),
            ]),
            GraphOptions::default(),
        )
    }

    fn names(nodes: &BTreeSet<ProjectId>) -> Vec<&str> {
        nodes.iter().map(ProjectId::as_str).collect()
    }

    #[test]
    fn up_and_down_use_full_relations() {
        let graph = graph();
        let up = graph
            .select_for_root(&RootQuery::Name("MID".into()), ViewDirection::Up)
            .expect("select");
        assert_eq!(names(&up.nodes), vec!["ext/zlib", "src/base/base", "src/mid/mid"]);

        let down = graph
            .select_for_root(&RootQuery::Name("base".into()), ViewDirection::Down)
            .expect("select");
        assert_eq!(names(&down.nodes), vec!["src/app/app", "src/base/base", "src/mid/mid"]);
    }

    #[test]
    fn neighborhood_uses_minimal_relations() {
        let graph = graph();
        let view = graph.select_around(&id("src/base/base"), ViewDirection::Neighborhood);
        assert_eq!(names(&view.nodes), vec!["src/base/base", "src/mid/mid"]);
        assert_eq!(view.edges.len(), 1);
        assert_eq!(view.edges[0].dependency, id("src/base/base"));
        assert_eq!(view.edges[0].dependent, id("src/mid/mid"));
    }

    #[test]
    fn root_lookup_errors() {
        let graph = graph();
        assert_eq!(
            graph.find_root(&RootQuery::Name("nothing".into())),
            Err(SelectError::RootNotFound("nothing".into()))
        );
        assert!(matches!(
            graph.find_root(&RootQuery::Name("src/".into())),
            Err(SelectError::RootAmbiguous { ref matches, .. }) if matches.len() == 3
        ));
        assert_eq!(
            graph.find_root(&RootQuery::Alias(99)),
            Err(SelectError::UnknownAlias(99))
        );
    }

    #[test]
    fn alias_lookup_resolves_sorted_position() {
        let graph = graph();
        // ext/zlib < src/app/app < src/base/base < src/mid/mid
        assert_eq!(graph.find_root(&RootQuery::Alias(1)), Ok(id("src/app/app")));
    }

    #[test]
    fn select_all_can_hide_externals() {
        let graph = graph();
        assert_eq!(graph.select_all(false).nodes.len(), 4);
        let internal = graph.select_all(true);
        assert_eq!(internal.nodes.len(), 3);
        assert!(internal.edges.iter().all(|e| e.dependency != id("ext/zlib")));
    }

    #[test]
    fn internal_only_graph_hides_externals_from_root_views() {
        let graph = DependencyGraph::build(
            ReferenceIndex::new([
                (Project::new("app", false), vec![id("ext")]),
                (Project::new("ext", true), vec![id("core")]),
                (Project::new("core", false), vec![]),
            ]),
            GraphOptions {
                internal_only: true,
            },
        );
        let up = graph.select_around(&id("app"), ViewDirection::Up);
        assert_eq!(names(&up.nodes), vec!["app", "core"]);
        assert_eq!(up.edges.len(), 1);
        assert!(graph.find_root(&RootQuery::Name("ext".into())).is_err());
    }

    #[test]
    fn direction_parses_cli_spellings() {
        assert_eq!("UP".parse::<ViewDirection>(), Ok(ViewDirection::Up));
        assert_eq!("down".parse::<ViewDirection>(), Ok(ViewDirection::Down));
        assert_eq!("".parse::<ViewDirection>(), Ok(ViewDirection::Neighborhood));
        assert!("sideways".parse::<ViewDirection>().is_err());
    }
}
