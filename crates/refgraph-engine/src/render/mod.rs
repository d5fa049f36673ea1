//! Renderer-agnostic description of one diagram.
//!
//! Views are composed into a [`RenderGraph`] by [`crate::view::compose`] and
//! handed to a [`Renderer`]. Node keys are project aliases (or
//! alias-plus-column for leaderboards), never raw paths, so renderer output
//! stays stable across machines.

pub mod batch;
pub mod dot;
pub mod gate;

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

pub use dot::DotRenderer;
pub use gate::{RenderGate, SerializedRenderer};

/// One diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderGraph {
    /// Output file stem.
    pub name: String,
    pub title: Option<String>,
    pub body: RenderBody,
    /// Navigation links drawn above the graph, in order.
    pub nav: Vec<NavLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum RenderBody {
    Dependency {
        nodes: Vec<RenderNode>,
        edges: Vec<RenderEdge>,
    },
    Leaderboard {
        columns: Vec<RenderColumn>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderNode {
    pub key: String,
    pub label: String,
    /// Secondary line, e.g. build sequence and duration.
    pub detail: String,
    pub fill: String,
    pub tooltip: String,
    pub hidden: bool,
    /// Page of this project, in multi-view output.
    pub link: Option<String>,
    /// Build detail page, in multi-view output.
    pub detail_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEdge {
    pub from: String,
    pub to: String,
    pub tooltip: String,
    pub color: String,
    pub visible: bool,
}

/// A stacked leaderboard column; nodes render top to bottom under the
/// header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderColumn {
    pub header: String,
    pub nodes: Vec<RenderNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: String,
    pub target: String,
}

/// Turns a [`RenderGraph`] into an artifact.
pub trait Renderer: Send + Sync {
    /// Render `graph`, returning the path of the primary artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written.
    fn render(&self, graph: &RenderGraph) -> Result<PathBuf>;
}

impl<R: Renderer + ?Sized> Renderer for &R {
    fn render(&self, graph: &RenderGraph) -> Result<PathBuf> {
        (**self).render(graph)
    }
}

impl RenderGraph {
    /// Number of drawn nodes, hidden ones included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match &self.body {
            RenderBody::Dependency { nodes, .. } => nodes.len(),
            RenderBody::Leaderboard { columns } => columns.iter().map(|c| c.nodes.len()).sum(),
        }
    }
}
