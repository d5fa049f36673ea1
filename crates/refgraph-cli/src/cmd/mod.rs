//! Subcommand handlers and the arguments they share.

pub mod completions;
pub mod cycles;
pub mod export_deps;
pub mod graph;
pub mod leaderboard;
pub mod multi;
pub mod query;
pub mod stats;
pub mod timings;

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use refgraph_core::buildlog::{BuildLog, TimingSource};
use refgraph_core::config::RefgraphConfig;
use refgraph_core::scan;
use refgraph_engine::render::DotRenderer;
use refgraph_engine::view::RootQuery;
use refgraph_engine::{DependencyGraph, GraphOptions, ReferenceIndex};
use tracing::info;

/// Where the projects come from.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Solution (`.sln`), solution filter (`.slnf`) or directory to scan.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Build log with timing summaries to attach.
    #[arg(short = 'l', long = "build-log", value_name = "LOG")]
    pub build_log: Option<PathBuf>,

    /// Leave projects outside the scan out of reductions and views.
    #[arg(long)]
    pub internal_only: bool,
}

/// How the root project of a view is named.
#[derive(Args, Debug, Clone, Default)]
pub struct RootArgs {
    /// Case-insensitive fragment of the root project's path.
    #[arg(short, long, value_name = "NAME")]
    pub root: Option<String>,

    /// Alias of the root project, as printed by `refgraph query`.
    #[arg(long, value_name = "ALIAS", conflicts_with = "root")]
    pub alias: Option<u32>,
}

impl RootArgs {
    pub fn query(&self) -> Option<RootQuery> {
        match (&self.root, self.alias) {
            (_, Some(alias)) => Some(RootQuery::Alias(alias)),
            (Some(name), None) => Some(RootQuery::Name(name.clone())),
            (None, None) => None,
        }
    }
}

/// Renderer overrides on top of the `[render]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    /// Directory pages are written to.
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Graphviz `dot` executable used to lay out pages.
    #[arg(long, value_name = "PATH")]
    pub dot: Option<PathBuf>,

    /// Output format passed to `dot -T`.
    #[arg(long, value_name = "FORMAT")]
    pub render_format: Option<String>,
}

impl RenderArgs {
    pub fn renderer(&self, config: &RefgraphConfig) -> DotRenderer {
        let out_dir = self
            .out_dir
            .clone()
            .unwrap_or_else(|| config.render.out_dir.clone());
        DotRenderer::new(out_dir)
            .with_dot_command(self.dot.clone().or_else(|| config.render.dot_command.clone()))
            .with_format(self.format(config))
    }

    pub fn format(&self, config: &RefgraphConfig) -> String {
        self.render_format
            .clone()
            .unwrap_or_else(|| config.render.format.clone())
    }
}

/// A built graph plus the log its timing came from.
pub struct Loaded {
    pub graph: DependencyGraph,
    pub log: Option<BuildLog>,
}

/// Scan the input, parse the optional build log and build the graph.
///
/// # Errors
///
/// Fails when the input cannot be scanned or the build log cannot be read.
pub fn load(args: &InputArgs, config: &RefgraphConfig) -> anyhow::Result<Loaded> {
    let scan = scan::scan(&args.input)
        .with_context(|| format!("scan {}", args.input.display()))?;
    info!(
        projects = scan.projects.len(),
        primary = scan.primary_count(),
        "scan finished"
    );
    let index = ReferenceIndex::from_scan(scan);

    let log = args
        .build_log
        .as_deref()
        .map(BuildLog::from_path)
        .transpose()?;
    let facts = log.as_ref().map(TimingSource::facts).unwrap_or_default();

    let options = GraphOptions {
        internal_only: args.internal_only || config.graph.internal_only,
    };
    let graph = DependencyGraph::build_with_timing(index, options, &facts);
    Ok(Loaded { graph, log })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_wins_over_name() {
        let args = RootArgs {
            root: None,
            alias: Some(4),
        };
        assert_eq!(args.query(), Some(RootQuery::Alias(4)));
        let args = RootArgs {
            root: Some("net".into()),
            alias: None,
        };
        assert_eq!(args.query(), Some(RootQuery::Name("net".into())));
        assert_eq!(RootArgs::default().query(), None);
    }

    #[test]
    fn render_flags_override_config() {
        let config = RefgraphConfig::default();
        let args = RenderArgs {
            out_dir: Some(PathBuf::from("pages")),
            dot: None,
            render_format: Some("png".into()),
        };
        let renderer = args.renderer(&config);
        assert_eq!(renderer.out_dir(), std::path::Path::new("pages"));
        assert_eq!(args.format(&config), "png");
        assert_eq!(RenderArgs::default().format(&config), "svg");
        assert_eq!(
            RenderArgs::default().renderer(&config).out_dir(),
            config.render.out_dir.as_path()
        );
    }

    #[test]
    fn missing_input_fails_to_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = InputArgs {
            input: dir.path().join("missing.sln"),
            build_log: None,
            internal_only: false,
        };
        let err = load(&args, &RefgraphConfig::default())
            .err()
            .expect("missing input");
        assert!(format!("{err:#}").contains("missing.sln"));
    }
}
