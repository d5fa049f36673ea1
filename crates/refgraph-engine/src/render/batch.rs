//! Multi-view rendering.
//!
//! Pages are composed on rayon workers against the shared, immutable graph.
//! Only the renderer call itself is serialized, by whatever gate the caller
//! wraps the renderer in.

use std::path::PathBuf;

use rayon::prelude::*;
use refgraph_core::error::ErrorCode;
use refgraph_core::project::ProjectId;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::Renderer;
use crate::engine::DependencyGraph;
use crate::view::compose::{PageOptions, dependency_page, leaderboard_page};
use crate::view::select::ViewDirection;

/// What a multi-view run renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub hide_external: bool,
    pub leaderboard_size: usize,
    /// Extension of linked pages.
    pub extension: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            hide_external: false,
            leaderboard_size: 10,
            extension: "svg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Job {
    Overview,
    Project(ProjectId, ViewDirection),
    Leaderboards,
}

/// Outcome of a multi-view run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub rendered: Vec<PathBuf>,
    /// `(page, error)` for every page that failed.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    /// `Err` when any page failed.
    ///
    /// # Errors
    ///
    /// Returns a [`BatchError`] counting the failed pages.
    pub fn check(&self) -> Result<(), BatchError> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(BatchError {
                failed: self.failed.len(),
                total: self.failed.len() + self.rendered.len(),
            })
        }
    }
}

/// Some pages of a multi-view run failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{failed} of {total} pages failed to render")]
pub struct BatchError {
    pub failed: usize,
    pub total: usize,
}

impl BatchError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::RenderFailed
    }
}

/// Render the overview, the neighborhood / upstream / downstream page of
/// every visible project, and the leaderboards.
#[instrument(skip_all, fields(projects = graph.index().len()))]
pub fn render_all<R: Renderer>(
    graph: &DependencyGraph,
    renderer: &R,
    options: &BatchOptions,
) -> BatchReport {
    let page_options = PageOptions::multi(options.extension.clone());
    let mut jobs = vec![Job::Overview, Job::Leaderboards];
    for project in graph.visible_projects(options.hide_external) {
        for direction in [ViewDirection::Neighborhood, ViewDirection::Up, ViewDirection::Down] {
            jobs.push(Job::Project(project.id.clone(), direction));
        }
    }

    let results: Vec<(String, anyhow::Result<PathBuf>)> = jobs
        .par_iter()
        .map(|job| {
            let page = match job {
                Job::Overview => {
                    dependency_page(graph, &graph.select_all(options.hide_external), &page_options)
                }
                Job::Project(id, direction) => {
                    dependency_page(graph, &graph.select_around(id, *direction), &page_options)
                }
                Job::Leaderboards => {
                    leaderboard_page(graph, options.leaderboard_size, &page_options)
                }
            };
            let result = renderer.render(&page);
            (page.name, result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (name, result) in results {
        match result {
            Ok(path) => report.rendered.push(path),
            Err(err) => {
                warn!(page = %name, error = %format!("{err:#}"), "page failed to render");
                report.failed.push((name, format!("{err:#}")));
            }
        }
    }
    info!(
        rendered = report.rendered.len(),
        failed = report.failed.len(),
        "multi-view render finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GraphOptions;
    use crate::graph::index::ReferenceIndex;
    use crate::render::{RenderGate, RenderGraph, SerializedRenderer};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        names: Mutex<Vec<String>>,
    }

    impl Renderer for Recording {
        fn render(&self, graph: &RenderGraph) -> anyhow::Result<PathBuf> {
            if graph.name == "1down" {
                anyhow::bail!("layout failed");
            }
            self.names.lock().push(graph.name.clone());
            Ok(PathBuf::from(format!("{}.svg", graph.name)))
        }
    }

    #[test]
    fn every_page_is_rendered_once_and_failures_are_collected() {
        let graph = DependencyGraph::build(
            ReferenceIndex::from_edges(&[("app", &["core"]), ("core", &[])]),
            GraphOptions::default(),
        );
        let renderer = SerializedRenderer::new(Recording::default(), RenderGate::new());
        let report = render_all(&graph, &renderer, &BatchOptions::default());

        assert_eq!(report.failed, vec![("1down".to_string(), "layout failed".to_string())]);
        assert_eq!(report.rendered.len(), 7);
        let err = report.check().expect_err("one page failed");
        assert_eq!((err.failed, err.total), (1, 8));
        assert_eq!(err.code(), ErrorCode::RenderFailed);

        let recording = Recording::default();
        render_all(&graph, &recording, &BatchOptions::default());
        let mut names = recording.names.into_inner();
        names.sort();
        assert_eq!(names, vec!["0", "0down", "0up", "1", "1up", "dep_graph", "leaderboards"]);
    }

    #[test]
    fn hidden_externals_get_no_pages() {
        let graph = DependencyGraph::build(
            ReferenceIndex::from_edges(&[("app", &["ext"])]),
            GraphOptions::default(),
        );
        let recording = Recording::default();
        let options = BatchOptions {
            hide_external: true,
            ..BatchOptions::default()
        };
        let report = render_all(&graph, &recording, &options);
        // overview, leaderboards, and three pages for "app" (alias 0)
        assert_eq!(report.rendered.len(), 5);
        assert!(report.failed.is_empty());
        assert!(report.check().is_ok());
    }
}
