//! `refgraph graph`: render one dependency view.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use refgraph_core::config::RefgraphConfig;
use refgraph_core::error::ErrorCode;
use refgraph_engine::render::{RenderBody, Renderer};
use refgraph_engine::view::{PageOptions, ViewDirection, dependency_page};
use serde::Serialize;

use super::{InputArgs, RenderArgs, RootArgs, load};
use crate::output::{Coded, OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `refgraph graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub root: RootArgs,

    /// Side of the root to show: `up`, `down` or `neighborhood`.
    #[arg(short, long, default_value = "neighborhood")]
    pub direction: ViewDirection,

    /// Leave external projects out of the overview.
    #[arg(long)]
    pub hide_external: bool,

    /// Aliases to draw invisible (comma separated).
    #[arg(long, value_delimiter = ',', value_name = "ALIAS")]
    pub hide: Vec<u32>,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Debug, Serialize)]
struct GraphOutput {
    path: PathBuf,
    name: String,
    title: Option<String>,
    nodes: usize,
    edges: usize,
}

/// Execute `refgraph graph`.
pub fn run_graph(
    args: &GraphArgs,
    config: &RefgraphConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let loaded = load(&args.input, config)?;
    let graph = &loaded.graph;

    let selection = match args.root.query() {
        Some(query) => graph.select_for_root(&query, args.direction)?,
        None => graph.select_all(args.hide_external),
    };
    let options = PageOptions {
        hidden: args.hide.iter().copied().collect::<BTreeSet<u32>>(),
        extension: args.render.format(config),
        ..PageOptions::default()
    };
    let page = dependency_page(graph, &selection, &options);
    let path = args
        .render
        .renderer(config)
        .render(&page)
        .context(Coded(ErrorCode::RenderFailed))?;

    let edges = match &page.body {
        RenderBody::Dependency { edges, .. } => edges.len(),
        RenderBody::Leaderboard { .. } => 0,
    };
    let payload = GraphOutput {
        path,
        nodes: page.node_count(),
        edges,
        name: page.name,
        title: page.title,
    };

    render_mode(
        output,
        &payload,
        |p, w| writeln!(w, "{}", p.path.display()),
        |p, w| {
            pretty_section(w, p.title.as_deref().unwrap_or(&p.name))?;
            pretty_kv(w, "Written", p.path.display().to_string())?;
            pretty_kv(w, "Projects", p.nodes.to_string())?;
            pretty_kv(w, "References", p.edges.to_string())
        },
    )
}
