//! `refgraph cycles`: list reference cycles (strongly connected components).

use std::io::Write;

use clap::Args;
use refgraph_core::config::RefgraphConfig;
use refgraph_engine::graph::find_all_cycles;
use serde::Serialize;

use super::{InputArgs, load};
use crate::output::{OutputMode, render};

/// Arguments for `refgraph cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<Vec<String>>,
}

/// Execute `refgraph cycles`.
pub fn run_cycles(
    args: &CyclesArgs,
    config: &RefgraphConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let loaded = load(&args.input, config)?;
    let cycles = find_all_cycles(&loaded.graph.raw().graph)
        .into_iter()
        .map(|cycle| cycle.iter().map(ToString::to_string).collect())
        .collect();
    let payload = CyclesOutput { cycles };

    render(output, &payload, |report, w| render_cycles_human(report, w))
}

fn render_cycles_human(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No reference cycles found.")?;
        return Ok(());
    }

    writeln!(w, "Reference cycles ({})", payload.cycles.len())?;

    for (idx, cycle) in payload.cycles.iter().enumerate() {
        writeln!(w, "\nCycle {}:", idx + 1)?;
        for project in cycle {
            writeln!(w, "  - {project}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_args_take_an_input() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: CyclesArgs,
        }

        let parsed = Wrapper::parse_from(["test", "All.sln", "--internal-only"]);
        assert_eq!(parsed.args.input.input, std::path::PathBuf::from("All.sln"));
        assert!(parsed.args.input.internal_only);
    }

    #[test]
    fn render_cycles_human_no_cycles() {
        let payload = CyclesOutput { cycles: Vec::new() };
        let mut out = Vec::new();

        render_cycles_human(&payload, &mut out).expect("render");

        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("No reference cycles found."));
    }

    #[test]
    fn render_cycles_human_lists_groups() {
        let payload = CyclesOutput {
            cycles: vec![vec!["src/a/a.vcxproj".to_string(), "src/b/b.vcxproj".to_string()]],
        };
        let mut out = Vec::new();

        render_cycles_human(&payload, &mut out).expect("render");

        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("Reference cycles (1)"));
        assert!(rendered.contains("Cycle 1:"));
        assert!(rendered.contains("  - src/b/b.vcxproj"));
    }
}
