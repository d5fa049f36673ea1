//! `refgraph leaderboard`: most referenced and slowest projects.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use refgraph_core::config::RefgraphConfig;
use refgraph_core::error::ErrorCode;
use refgraph_engine::render::Renderer;
use refgraph_engine::view::{Leaderboard, PageOptions, leaderboard_page};
use serde::Serialize;

use super::{InputArgs, RenderArgs, load};
use crate::output::{Coded, OutputMode, pretty_rule, render_mode};

/// Arguments for `refgraph leaderboard`.
#[derive(Args, Debug)]
pub struct LeaderboardArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Entries per board (defaults to `leaderboard.size`).
    #[arg(short = 'n', long, value_name = "N")]
    pub size: Option<usize>,

    /// Print the boards without rendering a page.
    #[arg(long)]
    pub no_render: bool,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Debug, Serialize)]
struct BoardRow {
    alias: Option<u32>,
    name: String,
    value: u64,
}

#[derive(Debug, Serialize)]
struct BoardOutput {
    header: String,
    entries: Vec<BoardRow>,
}

#[derive(Debug, Serialize)]
struct LeaderboardOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    boards: Vec<BoardOutput>,
}

/// Execute `refgraph leaderboard`.
pub fn run_leaderboard(
    args: &LeaderboardArgs,
    config: &RefgraphConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let loaded = load(&args.input, config)?;
    let graph = &loaded.graph;
    let n = args.size.unwrap_or(config.leaderboard.size);

    let path = if args.no_render {
        None
    } else {
        let options = PageOptions {
            extension: args.render.format(config),
            ..PageOptions::default()
        };
        let page = leaderboard_page(graph, n, &options);
        Some(
            args.render
                .renderer(config)
                .render(&page)
                .context(Coded(ErrorCode::RenderFailed))?,
        )
    };

    let boards = graph
        .leaderboards(n)
        .into_iter()
        .map(|Leaderboard { header, entries }| BoardOutput {
            header,
            entries: entries
                .into_iter()
                .map(|entry| BoardRow {
                    alias: graph.aliases().alias_of(&entry.id),
                    name: entry.id.display_name(),
                    value: entry.value,
                })
                .collect(),
        })
        .collect();
    let payload = LeaderboardOutput { path, boards };

    render_mode(
        output,
        &payload,
        |p, w| {
            for board in &p.boards {
                for row in &board.entries {
                    writeln!(w, "{}\t{}\t{}", board.header, row.name, row.value)?;
                }
            }
            Ok(())
        },
        |p, w| {
            for board in &p.boards {
                writeln!(w, "{}", board.header)?;
                pretty_rule(w)?;
                for (rank, row) in board.entries.iter().enumerate() {
                    let alias = row.alias.map(|a| format!("[{a}]")).unwrap_or_default();
                    writeln!(w, "{:>3}. {:<40} {:>10} {alias}", rank + 1, row.name, row.value)?;
                }
                writeln!(w)?;
            }
            if let Some(path) = &p.path {
                writeln!(w, "Written: {}", path.display())?;
            }
            Ok(())
        },
    )
}
