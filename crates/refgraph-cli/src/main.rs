#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use refgraph_core::config::{RefgraphConfig, load_config, resolve_output};
use refgraph_core::error::ErrorCode;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "refgraph: MSBuild project reference graphs",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of ./refgraph.toml.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Output mode from the flags alone, used before the config is loaded.
    fn flag_mode(&self) -> Option<OutputMode> {
        self.format
            .or_else(|| self.json.then_some(OutputMode::Json))
    }

    /// Derive the output mode from flags, `FORMAT`, and config.
    fn output_mode(&self, config: &RefgraphConfig) -> OutputMode {
        self.flag_mode().unwrap_or_else(|| {
            OutputMode::from_name(&resolve_output(self.json, config.output.as_deref()))
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Render",
        about = "Render one dependency view",
        long_about = "Render the overview, or the neighborhood, upstream or downstream view of one root project.",
        after_help = "EXAMPLES:\n    # Overview of a solution\n    refgraph graph All.sln\n\n    # Everything that depends on the network library\n    refgraph graph All.sln --root net --direction down\n\n    # Lay out with Graphviz and color by build time\n    refgraph graph All.sln -l build.log --dot /usr/bin/dot"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Render",
        about = "Render every view with links",
        long_about = "Render the overview, three pages per project, the leaderboards and build detail pages, all cross-linked.",
        after_help = "EXAMPLES:\n    # Browseable pages in ./dep_graph\n    refgraph multi All.sln -l build.log --dot /usr/bin/dot\n\n    # Skip pages for external projects\n    refgraph multi All.sln --hide-external"
    )]
    Multi(cmd::multi::MultiArgs),

    #[command(
        next_help_heading = "Render",
        about = "Show the leaderboards",
        long_about = "Rank projects by number of dependents and by build duration.",
        after_help = "EXAMPLES:\n    # Top 5 of each board\n    refgraph leaderboard All.sln -l build.log -n 5 --no-render"
    )]
    Leaderboard(cmd::leaderboard::LeaderboardArgs),

    #[command(
        next_help_heading = "Read",
        about = "List projects and references",
        long_about = "List the projects and minimal references of a view, with aliases.",
        after_help = "EXAMPLES:\n    # Every project with its alias\n    refgraph query All.sln\n\n    # Upstream of alias 4\n    refgraph query All.sln --alias 4 --direction up --format json"
    )]
    Query(cmd::query::QueryArgs),

    #[command(
        next_help_heading = "Read",
        about = "Report build times from a log",
        long_about = "Write build_times.csv and optional per-build detail pages from an MSBuild log.",
        after_help = "EXAMPLES:\n    # CSV in the working directory\n    refgraph timings build.log\n\n    # With detail pages\n    refgraph timings build.log --pages out/build"
    )]
    Timings(cmd::timings::TimingsArgs),

    #[command(
        name = "export-deps",
        next_help_heading = "Export",
        about = "Store flattened dependency lists",
        long_about = "Flatten the dependents (or dependencies) of components and store them in SQLite.",
        after_help = "EXAMPLES:\n    # Everything two components depend on\n    refgraph export-deps All.sln net zlib\n\n    # Dependents of a list of components\n    refgraph export-deps All.sln --batch components.txt --direction down"
    )]
    ExportDeps(cmd::export_deps::ExportDepsArgs),

    #[command(
        next_help_heading = "Diagnostics",
        about = "List reference cycles",
        after_help = "EXAMPLES:\n    refgraph cycles All.sln"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Diagnostics",
        about = "Summarize the graph",
        after_help = "EXAMPLES:\n    refgraph stats All.sln -l build.log --format json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    refgraph completions bash > /etc/bash_completion.d/refgraph"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("REFGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "refgraph=debug,info"
        } else {
            "refgraph=info,warn"
        })
    });

    let format = env::var("REFGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, config: &RefgraphConfig, output: OutputMode) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Graph(args) => cmd::graph::run_graph(args, config, output),
        Commands::Multi(args) => cmd::multi::run_multi(args, config, output),
        Commands::Leaderboard(args) => cmd::leaderboard::run_leaderboard(args, config, output),
        Commands::Query(args) => cmd::query::run_query(args, config, output),
        Commands::Timings(args) => cmd::timings::run_timings(args, output),
        Commands::ExportDeps(args) => cmd::export_deps::run_export_deps(args, config, output),
        Commands::Cycles(args) => cmd::cycles::run_cycles(args, config, output),
        Commands::Stats(args) => cmd::stats::run_stats(args, config, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn fail(mode: OutputMode, error: &CliError) -> ExitCode {
    if render_error(mode, error).is_err() {
        eprintln!("error: {}", error.message);
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let mode = cli.flag_mode().unwrap_or(OutputMode::Text);
            return fail(
                mode,
                &CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError),
            );
        }
    };
    debug!(?config, "configuration loaded");
    let output = cli.output_mode(&config);

    match run(&cli, &config, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(output, &CliError::from(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["refgraph", "--json", "stats", "All.sln"]);
        assert!(cli.json);
        assert!(cli.output_mode(&RefgraphConfig::default()).is_json());
    }

    #[test]
    fn format_flag_after_subcommand() {
        let cli = Cli::parse_from(["refgraph", "stats", "All.sln", "--format", "text"]);
        assert_eq!(cli.flag_mode(), Some(OutputMode::Text));
    }

    #[test]
    fn format_flag_beats_config() {
        let cli = Cli::parse_from(["refgraph", "--format", "pretty", "stats", "All.sln"]);
        let config = RefgraphConfig {
            output: Some("json".to_string()),
            ..RefgraphConfig::default()
        };
        assert_eq!(cli.output_mode(&config), OutputMode::Pretty);
    }

    #[test]
    fn graph_subcommand_parses_view_flags() {
        let cli = Cli::parse_from([
            "refgraph",
            "graph",
            "All.sln",
            "--root",
            "net",
            "--direction",
            "down",
            "--hide",
            "3,7",
            "-l",
            "build.log",
        ]);
        let Commands::Graph(args) = cli.command else {
            panic!("expected graph");
        };
        assert_eq!(args.root.root.as_deref(), Some("net"));
        assert_eq!(args.direction, refgraph_engine::view::ViewDirection::Down);
        assert_eq!(args.hide, vec![3, 7]);
        assert_eq!(args.input.build_log, Some(PathBuf::from("build.log")));
    }

    #[test]
    fn root_and_alias_conflict() {
        let result =
            Cli::try_parse_from(["refgraph", "graph", "All.sln", "--root", "net", "--alias", "2"]);
        assert!(result.is_err());
    }

    #[test]
    fn export_direction_defaults_to_up() {
        let cli = Cli::parse_from(["refgraph", "export-deps", "All.sln", "net"]);
        let Commands::ExportDeps(args) = cli.command else {
            panic!("expected export-deps");
        };
        assert_eq!(args.direction, refgraph_engine::view::ExportDirection::Up);
        assert_eq!(args.components, vec!["net".to_string()]);
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["refgraph", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["refgraph", "graph", "All.sln"],
            vec!["refgraph", "multi", "All.sln"],
            vec!["refgraph", "leaderboard", "All.sln", "-n", "3"],
            vec!["refgraph", "query", "All.sln", "--alias", "1"],
            vec!["refgraph", "timings", "build.log"],
            vec!["refgraph", "export-deps", "All.sln", "--batch", "list.txt"],
            vec!["refgraph", "cycles", "All.sln"],
            vec!["refgraph", "stats", "All.sln"],
            vec!["refgraph", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(
                result.is_ok(),
                "Failed to parse: {:?} error: {:?}",
                args,
                result.err()
            );
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
