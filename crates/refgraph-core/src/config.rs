use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Project-level config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "refgraph.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefgraphConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Preferred output mode (`pretty`, `text`, `json`).
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Only show projects found by the scan itself.
    #[serde(default)]
    pub internal_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
    /// Graphviz `dot` executable. When unset only `.gv` sources are written.
    #[serde(default)]
    pub dot_command: Option<PathBuf>,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            dot_command: None,
            format: default_format(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_leaderboard_size")]
    pub size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            size: default_leaderboard_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

/// Path of the per-user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("refgraph/config.toml"))
}

/// Load the effective config.
///
/// The user file is the base layer and the project file (`explicit`, or
/// `refgraph.toml` in the working directory) overrides it key by key. An
/// explicit path that does not exist is an error; the implicit files are
/// optional.
///
/// # Errors
///
/// Returns an error if a file cannot be read or parsed.
pub fn load_config(explicit: Option<&Path>) -> Result<RefgraphConfig> {
    if let Some(path) = explicit
        && !path.exists()
    {
        anyhow::bail!("config file {} does not exist", path.display());
    }
    let project = explicit.map_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE), Path::to_path_buf);
    load_layered(user_config_path().as_deref(), Some(&project))
}

/// Merge the given files over the defaults, later layers winning.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read or parsed.
pub fn load_layered(user: Option<&Path>, project: Option<&Path>) -> Result<RefgraphConfig> {
    let mut merged = toml::Table::new();
    for path in [user, project].into_iter().flatten() {
        if let Some(layer) = read_table(path)? {
            merge_tables(&mut merged, layer);
        }
    }

    toml::Value::Table(merged)
        .try_into::<RefgraphConfig>()
        .context("Failed to interpret merged configuration")
}

fn read_table(path: &Path) -> Result<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<toml::Table>(&content)
        .map(Some)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Pick the output mode: `--json`, then `FORMAT`, then config, then TTY.
#[must_use]
pub fn resolve_output(cli_json: bool, config_output: Option<&str>) -> String {
    resolve_output_with(cli_json, config_output, env::var("FORMAT").ok().as_deref())
}

fn resolve_output_with(
    cli_json: bool,
    config_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = config_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dep_graph")
}

fn default_format() -> String {
    "svg".to_string()
}

const fn default_leaderboard_size() -> usize {
    10
}

fn default_database() -> PathBuf {
    PathBuf::from("refgraph.sqlite3")
}
