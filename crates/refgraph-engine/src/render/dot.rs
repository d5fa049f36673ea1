//! Graphviz DOT backend.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument};

use super::{NavLink, RenderBody, RenderColumn, RenderEdge, RenderGraph, RenderNode, Renderer};

/// Writes `<name>.gv` and, with a `dot` command configured, lays it out
/// into `<name>.<format>`.
#[derive(Debug, Clone)]
pub struct DotRenderer {
    out_dir: PathBuf,
    dot_command: Option<PathBuf>,
    format: String,
}

impl DotRenderer {
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            dot_command: None,
            format: "svg".to_string(),
        }
    }

    #[must_use]
    pub fn with_dot_command(mut self, command: Option<PathBuf>) -> Self {
        self.dot_command = command;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn layout(&self, dot: &Path, source: &Path, target: &Path) -> Result<()> {
        let output = Command::new(dot)
            .arg(format!("-T{}", self.format))
            .arg("-o")
            .arg(target)
            .arg(source)
            .output()
            .with_context(|| format!("run {}", dot.display()))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                dot.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

impl Renderer for DotRenderer {
    #[instrument(skip_all, fields(name = %graph.name))]
    fn render(&self, graph: &RenderGraph) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("create output directory {}", self.out_dir.display()))?;

        let source = self.out_dir.join(format!("{}.gv", graph.name));
        std::fs::write(&source, to_dot(graph))
            .with_context(|| format!("write {}", source.display()))?;
        debug!(path = %source.display(), nodes = graph.node_count(), "wrote graph source");

        let Some(dot) = &self.dot_command else {
            return Ok(source);
        };
        let target = self
            .out_dir
            .join(format!("{}.{}", graph.name, self.format));
        self.layout(dot, &source, &target)?;
        info!(path = %target.display(), "rendered graph");
        Ok(target)
    }
}

/// DOT source of `graph`.
#[must_use]
pub fn to_dot(graph: &RenderGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph {} {{", quote(&graph.name));

    let mut graph_attrs: Vec<(&str, String)> = vec![("concentrate", "true".into())];
    match &graph.body {
        RenderBody::Dependency { .. } => {
            if let Some(title) = &graph.title {
                graph_attrs.push(("label", format!("<<b>{}</b>>", escape_html(title))));
            }
            graph_attrs.extend([
                ("labeljust", "l".into()),
                ("labelloc", "t".into()),
                ("nodesep", "1".into()),
                ("ranksep", quote("1 equally")),
            ]);
        }
        RenderBody::Leaderboard { .. } => {
            if let Some(title) = &graph.title {
                graph_attrs.push(("label", format!("<<b><u>{}</u></b>>", escape_html(title))));
            }
            graph_attrs.extend([
                ("labelloc", "t".into()),
                ("nodesep", "1".into()),
                ("ranksep", quote("0.25 equally")),
            ]);
        }
    }
    graph_attrs.push(("splines", "ortho".into()));
    let _ = writeln!(out, "\tgraph {}", attr_list(&graph_attrs));
    let _ = writeln!(out, "\tnode [shape=box]");

    write_nav(&mut out, &graph.nav);
    match &graph.body {
        RenderBody::Dependency { nodes, edges } => {
            for node in nodes {
                write_node(&mut out, node);
            }
            for edge in edges {
                write_edge(&mut out, edge);
            }
        }
        RenderBody::Leaderboard { columns } => {
            for (i, column) in columns.iter().enumerate() {
                write_column(&mut out, i, column);
            }
        }
    }

    out.push_str("}\n");
    out
}

fn write_nav(out: &mut String, nav: &[NavLink]) {
    let mut previous: Option<String> = None;
    for (i, link) in nav.iter().enumerate() {
        let key = format!("nav_{i}");
        let _ = writeln!(
            out,
            "\t{} {}",
            quote(&key),
            attr_list(&[
                ("label", quote(&link.label)),
                ("URL", quote(&link.target)),
                ("fontcolor", quote("#0000ee")),
            ])
        );
        if let Some(prev) = previous {
            let _ = writeln!(out, "\t{} -> {} [style=invis]", quote(&prev), quote(&key));
        }
        previous = Some(key);
    }
}

fn write_node(out: &mut String, node: &RenderNode) {
    let mut attrs = vec![
        ("label", node_label(node)),
        ("style", if node.hidden { "invis" } else { "filled" }.into()),
        ("fillcolor", quote(&node.fill)),
        ("tooltip", quote(&node.tooltip)),
    ];
    if node.hidden {
        attrs.truncate(2);
    }
    let _ = writeln!(out, "\t{} {}", quote(&node.key), attr_list(&attrs));
}

fn write_edge(out: &mut String, edge: &RenderEdge) {
    let mut attrs = vec![
        ("tooltip", quote(&edge.tooltip)),
        ("color", quote(&edge.color)),
    ];
    if !edge.visible {
        attrs.push(("style", "invis".into()));
    }
    let _ = writeln!(
        out,
        "\t{} -> {} {}",
        quote(&edge.from),
        quote(&edge.to),
        attr_list(&attrs)
    );
}

fn write_column(out: &mut String, index: usize, column: &RenderColumn) {
    let header = format!("header_{index}");
    let _ = writeln!(
        out,
        "\t{} [label=<<b>{}</b>>]",
        quote(&header),
        escape_html(&column.header)
    );
    let mut previous = header;
    for node in &column.nodes {
        write_node(out, node);
        let _ = writeln!(out, "\t{} -> {} [style=invis]", quote(&previous), quote(&node.key));
        previous.clone_from(&node.key);
    }
}

/// Plain two-line label, or an HTML table when the node carries links.
fn node_label(node: &RenderNode) -> String {
    if node.link.is_none() && node.detail_link.is_none() {
        return if node.detail.is_empty() {
            quote(&node.label)
        } else {
            format!("\"{}\\n{}\"", escape_quoted(&node.label), escape_quoted(&node.detail))
        };
    }

    let cell = |text: &str, href: Option<&String>| match href {
        Some(href) => format!(
            "<tr><td href=\"{}\">{}</td></tr>",
            escape_html(href),
            escape_html(text)
        ),
        None => format!("<tr><td>{}</td></tr>", escape_html(text)),
    };
    let mut rows = cell(&node.label, node.link.as_ref());
    if !node.detail.is_empty() {
        rows.push_str(&cell(&node.detail, node.detail_link.as_ref()));
    }
    format!("<<table border=\"0\" cellborder=\"0\" cellspacing=\"0\">{rows}</table>>")
}

fn attr_list(attrs: &[(&str, String)]) -> String {
    let body: Vec<String> = attrs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("[{}]", body.join(", "))
}

fn quote(text: &str) -> String {
    format!("\"{}\"", escape_quoted(text))
}

/// Escape for a DOT double-quoted string.
#[must_use]
pub fn escape_quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
