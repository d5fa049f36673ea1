//! `refgraph stats`: graph summary.

use std::io::Write;

use clap::Args;
use refgraph_core::config::RefgraphConfig;
use refgraph_engine::GraphStats;
use serde::Serialize;

use super::{InputArgs, load};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `refgraph stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

/// Report payload for `refgraph stats`.
#[derive(Debug, Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    stats: GraphStats,
    reduction_ratio: f64,
    unmatched_timings: Vec<String>,
}

/// Execute `refgraph stats`.
pub fn run_stats(
    args: &StatsArgs,
    config: &RefgraphConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let loaded = load(&args.input, config)?;
    let stats = GraphStats::from_graph(&loaded.graph);
    let payload = StatsOutput {
        reduction_ratio: stats.reduction_ratio(),
        unmatched_timings: loaded.graph.timing().unmatched.clone(),
        stats,
    };

    render_mode(
        output,
        &payload,
        |p, w| {
            let s = &p.stats;
            writeln!(w, "projects\t{}", s.project_count)?;
            writeln!(w, "internal\t{}", s.internal_count)?;
            writeln!(w, "external\t{}", s.external_count)?;
            writeln!(w, "direct_edges\t{}", s.direct_edge_count)?;
            writeln!(w, "minimal_edges\t{}", s.minimal_edge_count)?;
            writeln!(w, "cycles\t{}", s.cycle_count)?;
            writeln!(w, "timed\t{}", s.timed_count)?;
            writeln!(w, "max_duration_ms\t{}", s.max_duration_ms)?;
            writeln!(w, "content_hash\t{}", s.content_hash)
        },
        |p, w| render_stats_human(p, w),
    )
}

fn render_stats_human(payload: &StatsOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let s = &payload.stats;
    pretty_section(w, "Dependency graph")?;
    pretty_kv(
        w,
        "Projects",
        format!(
            "{} ({} internal, {} external)",
            s.project_count, s.internal_count, s.external_count
        ),
    )?;
    pretty_kv(w, "References", s.direct_edge_count.to_string())?;
    pretty_kv(
        w,
        "Minimal",
        format!(
            "{} ({:.0}% redundant)",
            s.minimal_edge_count,
            payload.reduction_ratio * 100.0
        ),
    )?;
    pretty_kv(w, "Density", format!("{:.4}", s.density))?;
    pretty_kv(w, "Components", s.weakly_connected_component_count.to_string())?;
    pretty_kv(w, "Max in-degree", s.max_in_degree.to_string())?;
    pretty_kv(w, "Max out-degree", s.max_out_degree.to_string())?;
    pretty_kv(
        w,
        "Cycles",
        if s.has_cycles() {
            format!("{} (run `refgraph cycles`)", s.cycle_count)
        } else {
            "none".to_string()
        },
    )?;

    writeln!(w)?;
    pretty_section(w, "Build timing")?;
    pretty_kv(w, "Timed projects", s.timed_count.to_string())?;
    pretty_kv(w, "Longest build", format!("{} ms", s.max_duration_ms))?;
    if !payload.unmatched_timings.is_empty() {
        pretty_kv(w, "Unmatched", payload.unmatched_timings.len().to_string())?;
        for name in &payload.unmatched_timings {
            writeln!(w, "  {name}")?;
        }
    }

    writeln!(w)?;
    pretty_kv(w, "Content hash", &s.content_hash)
}
