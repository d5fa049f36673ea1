//! `refgraph query`: list the projects and references of a view.

use std::io::Write;

use clap::Args;
use refgraph_core::config::RefgraphConfig;
use refgraph_engine::view::ViewDirection;
use serde::Serialize;

use super::{InputArgs, RootArgs, load};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `refgraph query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub root: RootArgs,

    /// Side of the root to list: `up`, `down` or `neighborhood`.
    #[arg(short, long, default_value = "neighborhood")]
    pub direction: ViewDirection,

    /// Leave external projects out when no root is given.
    #[arg(long)]
    pub hide_external: bool,
}

#[derive(Debug, Serialize)]
struct ProjectRow {
    alias: Option<u32>,
    id: String,
    name: String,
    external: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct EdgeRow {
    dependency: String,
    dependent: String,
    unused: bool,
}

#[derive(Debug, Serialize)]
struct QueryOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    direction: Option<ViewDirection>,
    projects: Vec<ProjectRow>,
    references: Vec<EdgeRow>,
}

/// Execute `refgraph query`.
pub fn run_query(
    args: &QueryArgs,
    config: &RefgraphConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let loaded = load(&args.input, config)?;
    let graph = &loaded.graph;

    let selection = match args.root.query() {
        Some(query) => graph.select_for_root(&query, args.direction)?,
        None => graph.select_all(args.hide_external),
    };

    let projects = selection
        .nodes
        .iter()
        .filter_map(|id| graph.project(id))
        .map(|project| ProjectRow {
            alias: graph.aliases().alias_of(&project.id),
            id: project.id.to_string(),
            name: project.display_name(),
            external: project.is_external,
            build: project.build.as_ref().map(|b| b.sequence),
            duration_ms: project.build.as_ref().map(|b| b.duration_ms),
        })
        .collect();
    let references = selection
        .edges
        .iter()
        .map(|edge| EdgeRow {
            dependency: edge.dependency.display_name(),
            dependent: edge.dependent.display_name(),
            unused: edge.unused,
        })
        .collect();
    let payload = QueryOutput {
        root: selection.root.as_ref().map(ToString::to_string),
        direction: selection.direction,
        projects,
        references,
    };

    render_mode(
        output,
        &payload,
        |p, w| {
            for row in &p.projects {
                let alias = row.alias.map(|a| a.to_string()).unwrap_or_default();
                writeln!(w, "{alias}\t{}\t{}", row.name, row.id)?;
            }
            Ok(())
        },
        |p, w| {
            if let Some(root) = &p.root {
                pretty_kv(w, "Root", root)?;
            }
            if let Some(direction) = p.direction {
                pretty_kv(w, "Direction", direction.to_string())?;
            }
            pretty_section(w, &format!("Projects ({})", p.projects.len()))?;
            for row in &p.projects {
                let alias = row.alias.map(|a| a.to_string()).unwrap_or_default();
                let mut notes = Vec::new();
                if row.external {
                    notes.push("external".to_string());
                }
                if let (Some(build), Some(ms)) = (row.build, row.duration_ms) {
                    notes.push(format!("#{build} {ms} ms"));
                }
                let notes = if notes.is_empty() {
                    String::new()
                } else {
                    format!("  ({})", notes.join(", "))
                };
                writeln!(w, "{alias:>5}  {}{notes}", row.name)?;
            }
            writeln!(w)?;
            pretty_section(w, &format!("References ({})", p.references.len()))?;
            for edge in &p.references {
                let marker = if edge.unused { "  [unused]" } else { "" };
                writeln!(w, "  {} -> {}{marker}", edge.dependency, edge.dependent)?;
            }
            Ok(())
        },
    )
}
