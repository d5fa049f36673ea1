//! `refgraph timings`: build time report and detail pages from a build log.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use refgraph_core::buildlog::BuildLog;
use refgraph_core::buildlog::report::{BUILD_TIMES_FILE, write_build_pages, write_build_times};
use refgraph_core::error::ErrorCode;
use serde::Serialize;

use crate::output::{Coded, OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `refgraph timings`.
#[derive(Args, Debug)]
pub struct TimingsArgs {
    /// Build log with timing summaries.
    #[arg(value_name = "LOG")]
    pub log: PathBuf,

    /// Where to write the CSV report.
    #[arg(long, value_name = "FILE", default_value = BUILD_TIMES_FILE)]
    pub csv: PathBuf,

    /// Also write per-build HTML detail pages into this directory.
    #[arg(long, value_name = "DIR")]
    pub pages: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BuildRow {
    sequence: u32,
    project: String,
    duration_ms: u64,
    compile_ms: Option<u64>,
    link_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct TimingsOutput {
    csv: PathBuf,
    pages: usize,
    builds: Vec<BuildRow>,
}

/// Execute `refgraph timings`.
pub fn run_timings(args: &TimingsArgs, output: OutputMode) -> anyhow::Result<()> {
    let log = BuildLog::from_path(&args.log)?;

    write_build_times(&log, &args.csv).context(Coded(ErrorCode::OutputWriteFailed))?;
    let pages = match &args.pages {
        Some(dir) => write_build_pages(&log, dir).context(Coded(ErrorCode::OutputWriteFailed))?,
        None => 0,
    };

    let mut builds: Vec<BuildRow> = log
        .builds()
        .values()
        .map(|entry| BuildRow {
            sequence: entry.sequence,
            project: entry.project.clone(),
            duration_ms: entry.duration_ms,
            compile_ms: entry.compile_ms,
            link_ms: entry.link_ms,
        })
        .collect();
    builds.sort_by(|a, b| {
        b.duration_ms
            .cmp(&a.duration_ms)
            .then(a.sequence.cmp(&b.sequence))
    });
    let payload = TimingsOutput {
        csv: args.csv.clone(),
        pages,
        builds,
    };

    render_mode(
        output,
        &payload,
        |p, w| {
            for row in &p.builds {
                writeln!(w, "{}\t{}\t{}", row.sequence, row.duration_ms, row.project)?;
            }
            Ok(())
        },
        |p, w| {
            pretty_section(w, "Build times")?;
            pretty_kv(w, "Projects", p.builds.len().to_string())?;
            pretty_kv(w, "CSV", p.csv.display().to_string())?;
            if p.pages > 0 {
                pretty_kv(w, "Detail pages", p.pages.to_string())?;
            }
            writeln!(w)?;
            for row in &p.builds {
                let secs = row.duration_ms / 1000;
                writeln!(
                    w,
                    "{:>4}  {:02}:{:02}  {}",
                    format!("#{}", row.sequence),
                    (secs / 60) % 60,
                    secs % 60,
                    row.project
                )?;
            }
            Ok(())
        },
    )
}
