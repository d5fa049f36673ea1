//! Composition of selections into [`RenderGraph`] pages.

use std::collections::BTreeSet;

use refgraph_core::project::{Project, ProjectId, display_name};

use crate::engine::DependencyGraph;
use crate::render::{NavLink, RenderBody, RenderColumn, RenderEdge, RenderGraph, RenderNode};
use crate::view::select::{Selection, ViewDirection};
use crate::view::style;

/// Overview page name when the scan did not start from a solution.
pub const DEFAULT_PAGE: &str = "dep_graph";
pub const LEADERBOARD_PAGE: &str = "leaderboards";
/// Subdirectory of the output directory holding build detail pages.
pub const BUILD_PAGE_DIR: &str = "build";

/// Page-level rendering choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOptions {
    /// Emit cross-page links and navigation.
    pub multi: bool,
    /// Aliases drawn invisible.
    pub hidden: BTreeSet<u32>,
    /// Extension of linked pages.
    pub extension: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            multi: false,
            hidden: BTreeSet::new(),
            extension: "svg".to_string(),
        }
    }
}

impl PageOptions {
    #[must_use]
    pub fn multi(extension: impl Into<String>) -> Self {
        Self {
            multi: true,
            hidden: BTreeSet::new(),
            extension: extension.into(),
        }
    }

    fn page_link(&self, name: &str) -> String {
        format!("{name}.{}", self.extension)
    }
}

impl DependencyGraph {
    /// Display name of the scanned solution, if any.
    #[must_use]
    pub fn solution_display(&self) -> Option<String> {
        self.index().solution_name().map(display_name)
    }

    /// Name of the overview page.
    #[must_use]
    pub fn overview_name(&self) -> String {
        self.solution_display()
            .unwrap_or_else(|| DEFAULT_PAGE.to_string())
    }

    /// Page name of a selection: the root's alias (plus direction suffix in
    /// multi-view output) or the overview name.
    #[must_use]
    pub fn page_name(&self, selection: &Selection, multi: bool) -> String {
        let Some(alias) = selection.root.as_ref().and_then(|r| self.aliases().alias_of(r)) else {
            return self.overview_name();
        };
        let suffix = match selection.direction {
            Some(direction) if multi => direction.suffix(),
            _ => "",
        };
        format!("{alias}{suffix}")
    }

    fn page_title(&self, root: Option<&ProjectId>) -> String {
        let subject = root
            .map(ProjectId::display_name)
            .or_else(|| self.solution_display());
        match subject {
            Some(subject) => format!("{subject} Build Dependency Graph"),
            None => "Build Dependency Graph".to_string(),
        }
    }

    fn render_node(&self, project: &Project, key: String, options: &PageOptions) -> RenderNode {
        let alias = self.aliases().alias_of(&project.id);
        RenderNode {
            key,
            label: project.display_name(),
            detail: style::build_label(project),
            fill: style::node_color(project, self.max_duration_ms()),
            tooltip: project.relative_path(self.index().root()),
            hidden: alias.is_some_and(|a| options.hidden.contains(&a)),
            link: alias
                .filter(|_| options.multi)
                .map(|a| options.page_link(&a.to_string())),
            detail_link: project
                .build
                .as_ref()
                .filter(|_| options.multi)
                .map(|b| format!("{BUILD_PAGE_DIR}/build_{}.html", b.sequence)),
        }
    }

    fn node_key(&self, id: &ProjectId) -> String {
        self.aliases()
            .alias_of(id)
            .map_or_else(|| id.to_string(), |a| a.to_string())
    }

    fn navigation(&self, selection: &Selection, options: &PageOptions) -> Vec<NavLink> {
        let (Some(root), Some(direction)) = (&selection.root, selection.direction) else {
            return Vec::new();
        };
        if !options.multi {
            return Vec::new();
        }
        let base = self.node_key(root);
        let overview = self.overview_name();
        let mut nav = vec![NavLink {
            label: format!("Back to {overview}"),
            target: options.page_link(&overview),
        }];
        let link = |label: &str, page: String| NavLink {
            label: label.to_string(),
            target: options.page_link(&page),
        };
        match direction {
            ViewDirection::Up => nav.push(link("Hide dependencies", base)),
            ViewDirection::Down => nav.push(link("Hide references", base)),
            ViewDirection::Neighborhood => {
                nav.push(link("Show dependencies", format!("{base}up")));
                nav.push(link("Show references", format!("{base}down")));
            }
        }
        nav
    }
}

/// Dependency page for `selection`.
#[must_use]
pub fn dependency_page(
    graph: &DependencyGraph,
    selection: &Selection,
    options: &PageOptions,
) -> RenderGraph {
    let nodes: Vec<RenderNode> = selection
        .nodes
        .iter()
        .filter_map(|id| graph.project(id))
        .map(|project| graph.render_node(project, graph.node_key(&project.id), options))
        .collect();
    let hidden: BTreeSet<&str> = nodes
        .iter()
        .filter(|n| n.hidden)
        .map(|n| n.key.as_str())
        .collect();

    let edges: Vec<RenderEdge> = selection
        .edges
        .iter()
        .map(|edge| {
            let from = graph.node_key(&edge.dependency);
            let to = graph.node_key(&edge.dependent);
            RenderEdge {
                visible: !hidden.contains(from.as_str()) && !hidden.contains(to.as_str()),
                tooltip: format!(
                    "{} -> {}",
                    edge.dependency.display_name(),
                    edge.dependent.display_name()
                ),
                color: style::edge_color(edge.unused).to_string(),
                from,
                to,
            }
        })
        .collect();

    RenderGraph {
        name: graph.page_name(selection, options.multi),
        title: Some(graph.page_title(selection.root.as_ref())),
        nav: graph.navigation(selection, options),
        body: RenderBody::Dependency { nodes, edges },
    }
}

/// Leaderboards page with columns of `n` entries.
#[must_use]
pub fn leaderboard_page(graph: &DependencyGraph, n: usize, options: &PageOptions) -> RenderGraph {
    let columns = graph
        .leaderboards(n)
        .into_iter()
        .enumerate()
        .map(|(i, board)| RenderColumn {
            header: board.header,
            nodes: board
                .entries
                .iter()
                .filter_map(|entry| graph.project(&entry.id))
                .map(|project| {
                    let key = format!("{}_{i}", graph.node_key(&project.id));
                    graph.render_node(project, key, options)
                })
                .collect(),
        })
        .collect();

    RenderGraph {
        name: LEADERBOARD_PAGE.to_string(),
        title: Some(graph.solution_display().map_or_else(
            || "Leaderboards".to_string(),
            |name| format!("{name} Leaderboards"),
        )),
        nav: Vec::new(),
        body: RenderBody::Leaderboard { columns },
    }
}
