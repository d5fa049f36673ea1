//! Flattening selections into per-component dependency lists.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use refgraph_core::db::{ComponentExport, DependencySink};
use refgraph_core::project::ProjectId;
use serde::Serialize;
use tracing::{info, instrument};

use crate::engine::{DependencyGraph, SelectError};
use crate::view::select::{RootQuery, Selection, ViewDirection};

/// Prefix tried when a component name has no exact match.
pub const THIRD_PARTY_PREFIX: &str = "3rd_";

/// Which relation an exported list holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportDirection {
    /// Projects the component depends on (its closure).
    #[default]
    Up,
    /// Projects that depend on the component.
    Down,
}

impl ExportDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    #[must_use]
    pub const fn view(self) -> ViewDirection {
        match self {
            Self::Up => ViewDirection::Up,
            Self::Down => ViewDirection::Down,
        }
    }
}

impl fmt::Display for ExportDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "upstream" => Ok(Self::Up),
            "down" | "downstream" => Ok(Self::Down),
            other => Err(format!("unknown export direction '{other}' (expected up or down)")),
        }
    }
}

/// Sorted, unique display names of a selection, root excluded.
#[must_use]
pub fn flatten(graph: &DependencyGraph, selection: &Selection) -> Vec<String> {
    let names: BTreeSet<String> = selection
        .nodes
        .iter()
        .filter(|id| Some(*id) != selection.root.as_ref())
        .map(|id| {
            graph
                .project(id)
                .map_or_else(|| id.display_name(), |p| p.display_name())
        })
        .collect();
    names.into_iter().collect()
}

impl DependencyGraph {
    /// Resolve a component name: exact display name, then the name with the
    /// third-party prefix, then fuzzy root lookup.
    ///
    /// # Errors
    ///
    /// Returns the [`SelectError`] of the fuzzy lookup, or
    /// [`SelectError::RootAmbiguous`] when several projects share the exact
    /// display name.
    pub fn resolve_component(&self, name: &str) -> Result<ProjectId, SelectError> {
        for candidate in [name.to_string(), format!("{THIRD_PARTY_PREFIX}{name}")] {
            let exact: Vec<ProjectId> = self
                .visible_projects(self.options().internal_only)
                .filter(|p| p.display_name().eq_ignore_ascii_case(&candidate))
                .map(|p| p.id.clone())
                .collect();
            match exact.len() {
                0 => {}
                1 => return Ok(exact[0].clone()),
                _ => {
                    return Err(SelectError::RootAmbiguous {
                        query: name.to_string(),
                        matches: exact,
                    });
                }
            }
        }
        self.find_root(&RootQuery::Name(name.to_string()))
    }
}

/// Resolve `component`, flatten its selection in `direction` and store it.
///
/// # Errors
///
/// Fails when the component cannot be resolved or the sink rejects the
/// rows.
#[instrument(skip(graph, sink))]
pub fn export_component(
    graph: &DependencyGraph,
    component: &str,
    direction: ExportDirection,
    sink: &mut dyn DependencySink,
) -> Result<ComponentExport> {
    let root = graph.resolve_component(component)?;
    let selection = graph.select_around(&root, direction.view());
    let export = ComponentExport {
        component: component.to_string(),
        direction: direction.as_str().to_string(),
        dependencies: flatten(graph, &selection),
        snapshot: graph.content_hash().to_string(),
    };
    let stored = sink.replace(&export)?;
    info!(component, %direction, stored, "exported component dependencies");
    Ok(export)
}
