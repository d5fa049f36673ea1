//! `refgraph multi`: render every view with cross-page links.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use refgraph_core::buildlog::report::write_build_pages;
use refgraph_core::config::RefgraphConfig;
use refgraph_core::error::ErrorCode;
use refgraph_engine::render::batch::{BatchOptions, render_all};
use refgraph_engine::render::{RenderGate, SerializedRenderer};
use refgraph_engine::view::compose::BUILD_PAGE_DIR;
use serde::Serialize;

use super::{InputArgs, RenderArgs, load};
use crate::output::{Coded, OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `refgraph multi`.
#[derive(Args, Debug)]
pub struct MultiArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Give external projects no pages of their own.
    #[arg(long)]
    pub hide_external: bool,

    /// Entries per leaderboard (defaults to `leaderboard.size`).
    #[arg(short = 'n', long, value_name = "N")]
    pub leaderboard_size: Option<usize>,

    #[command(flatten)]
    pub render: RenderArgs,
}

#[derive(Debug, Serialize)]
struct MultiOutput {
    out_dir: PathBuf,
    rendered: usize,
    build_pages: usize,
    failed: Vec<(String, String)>,
}

/// Execute `refgraph multi`.
pub fn run_multi(
    args: &MultiArgs,
    config: &RefgraphConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let loaded = load(&args.input, config)?;
    let renderer = args.render.renderer(config);
    let out_dir = renderer.out_dir().to_path_buf();

    let options = BatchOptions {
        hide_external: args.hide_external,
        leaderboard_size: args.leaderboard_size.unwrap_or(config.leaderboard.size),
        extension: args.render.format(config),
    };
    let report = render_all(
        &loaded.graph,
        &SerializedRenderer::new(renderer, RenderGate::new()),
        &options,
    );

    let build_pages = match &loaded.log {
        Some(log) => write_build_pages(log, &out_dir.join(BUILD_PAGE_DIR))
            .context(Coded(ErrorCode::OutputWriteFailed))?,
        None => 0,
    };

    let payload = MultiOutput {
        out_dir,
        rendered: report.rendered.len(),
        build_pages,
        failed: report.failed.clone(),
    };
    render_mode(
        output,
        &payload,
        |p, w| {
            writeln!(w, "{}\t{}\t{}", p.out_dir.display(), p.rendered, p.failed.len())
        },
        |p, w| {
            pretty_section(w, "Multi-view render")?;
            pretty_kv(w, "Output", p.out_dir.display().to_string())?;
            pretty_kv(w, "Pages", p.rendered.to_string())?;
            pretty_kv(w, "Build pages", p.build_pages.to_string())?;
            for (page, error) in &p.failed {
                writeln!(w, "  failed {page}: {error}")?;
            }
            Ok(())
        },
    )?;

    report.check()?;
    Ok(())
}
