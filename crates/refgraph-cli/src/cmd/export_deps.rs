//! `refgraph export-deps`: store flattened dependency lists in SQLite.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use refgraph_core::config::RefgraphConfig;
use refgraph_core::db::SqliteSink;
use refgraph_core::error::ErrorCode;
use refgraph_engine::view::{ExportDirection, export_component};
use serde::Serialize;
use tracing::warn;

use super::{InputArgs, load};
use crate::output::{Coded, OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `refgraph export-deps`.
#[derive(Args, Debug)]
pub struct ExportDepsArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Component names to export.
    #[arg(value_name = "COMPONENT")]
    pub components: Vec<String>,

    /// File with one component name per line.
    #[arg(long, value_name = "FILE")]
    pub batch: Option<PathBuf>,

    /// `up` stores what the component depends on, `down` its dependents.
    #[arg(short, long, default_value_t = ExportDirection::Up)]
    pub direction: ExportDirection,

    /// Database file (defaults to `export.database`).
    #[arg(long, value_name = "FILE")]
    pub database: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Exported {
    component: String,
    dependencies: usize,
}

#[derive(Debug, Serialize)]
struct Failed {
    component: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    database: PathBuf,
    direction: ExportDirection,
    exported: Vec<Exported>,
    failed: Vec<Failed>,
}

/// Component names from the positional arguments and the batch file, blank
/// lines and `#` comments skipped.
fn component_names(args: &ExportDepsArgs) -> anyhow::Result<Vec<String>> {
    let mut names = args.components.clone();
    if let Some(path) = &args.batch {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read batch file {}", path.display()))?;
        names.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    if names.is_empty() {
        anyhow::bail!("no components given; pass names or --batch FILE");
    }
    Ok(names)
}

/// Execute `refgraph export-deps`.
///
/// Components are exported independently; a component that cannot be
/// resolved is reported and the rest of the batch continues.
pub fn run_export_deps(
    args: &ExportDepsArgs,
    config: &RefgraphConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let names = component_names(args)?;
    let loaded = load(&args.input, config)?;
    let database = args
        .database
        .clone()
        .unwrap_or_else(|| config.export.database.clone());
    let mut sink = SqliteSink::open(&database).context(Coded(ErrorCode::ExportDatabaseFailed))?;

    let mut exported = Vec::new();
    let mut failed = Vec::new();
    for name in names {
        match export_component(&loaded.graph, &name, args.direction, &mut sink) {
            Ok(export) => exported.push(Exported {
                component: export.component,
                dependencies: export.dependencies.len(),
            }),
            Err(err) => {
                warn!(component = %name, error = %format!("{err:#}"), "export failed");
                failed.push(Failed {
                    component: name,
                    error: format!("{err:#}"),
                });
            }
        }
    }

    let payload = ExportOutput {
        database,
        direction: args.direction,
        exported,
        failed,
    };
    render_mode(
        output,
        &payload,
        |p, w| {
            for row in &p.exported {
                writeln!(w, "ok\t{}\t{}", row.component, row.dependencies)?;
            }
            for row in &p.failed {
                writeln!(w, "failed\t{}\t{}", row.component, row.error)?;
            }
            Ok(())
        },
        |p, w| {
            pretty_section(w, "Dependency export")?;
            pretty_kv(w, "Database", p.database.display().to_string())?;
            pretty_kv(w, "Direction", p.direction.to_string())?;
            pretty_kv(w, "Exported", p.exported.len().to_string())?;
            for row in &p.exported {
                writeln!(w, "  {:<40} {} dependencies", row.component, row.dependencies)?;
            }
            if !p.failed.is_empty() {
                pretty_kv(w, "Failed", p.failed.len().to_string())?;
                for row in &p.failed {
                    writeln!(w, "  {}: {}", row.component, row.error)?;
                }
            }
            Ok(())
        },
    )
}
