//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for pipes, or stable
//! JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format` flag
//! 2. hidden `--json` flag
//! 3. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 4. `output` key of the config file
//! 5. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use refgraph_core::buildlog::BuildLogError;
use refgraph_core::error::ErrorCode;
use refgraph_core::scan::ScanError;
use refgraph_engine::SelectError;
use refgraph_engine::render::batch::BatchError;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<18} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized output (sections, aligned fields).
    Pretty,
    /// Plain rows for pipes and scripts.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    /// Parse a normalized mode name as produced by
    /// [`refgraph_core::config::resolve_output`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => Self::Json,
            "text" => Self::Text,
            _ => Self::Pretty,
        }
    }
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_to(&mut out, mode, value, text_fn, pretty_fn)
}

fn render_to<T: Serialize>(
    out: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, out)?,
        OutputMode::Pretty => pretty_fn(value, out)?,
    }
    Ok(())
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In pretty/text
/// mode, `human_fn` produces the output. For distinct text/pretty rendering,
/// use [`render_mode`].
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error from a message and a code from the shared table.
    pub fn with_code(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }
}

/// Context that pins an error to a code, for failures that have no domain
/// error type of their own (database, output files).
///
/// ```ignore
/// SqliteSink::open(path).context(Coded(ErrorCode::ExportDatabaseFailed))?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coded(pub ErrorCode);

impl fmt::Display for Coded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.message())
    }
}

/// Classify an error by its [`Coded`] context or the first domain error in
/// its chain.
impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        let code = err.downcast_ref::<Coded>().map(|c| c.0).or_else(|| {
            err.chain().find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<ScanError>() {
                    Some(e.code())
                } else if let Some(e) = cause.downcast_ref::<SelectError>() {
                    Some(e.code())
                } else if let Some(e) = cause.downcast_ref::<BatchError>() {
                    Some(e.code())
                } else {
                    cause.downcast_ref::<BuildLogError>().map(BuildLogError::code)
                }
            })
        });
        Self::with_code(message, code.unwrap_or(ErrorCode::InternalUnexpected))
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, mode, error)
}

fn write_error(out: &mut dyn Write, mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut *out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
    }

    fn rendered(mode: OutputMode) -> String {
        let mut buf = Vec::new();
        render_to(
            &mut buf,
            mode,
            &Sample { name: "core" },
            |v, w| writeln!(w, "{}", v.name),
            |v, w| pretty_kv(w, "name", v.name),
        )
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn modes_render_differently() {
        assert_eq!(rendered(OutputMode::Text), "core\n");
        assert!(rendered(OutputMode::Pretty).starts_with("name:"));
        let json: serde_json::Value = serde_json::from_str(&rendered(OutputMode::Json)).unwrap();
        assert_eq!(json["name"], "core");
    }

    #[test]
    fn mode_names_parse() {
        assert_eq!(OutputMode::from_name("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_name("text"), OutputMode::Text);
        assert_eq!(OutputMode::from_name("pretty"), OutputMode::Pretty);
        assert!(OutputMode::Json.is_json());
    }

    #[test]
    fn scan_errors_keep_their_code() {
        let err = anyhow::Error::new(ScanError::InputNotFound(PathBuf::from("/nope")))
            .context("scan input");
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E1001"));
        assert!(cli.message.contains("/nope"));
        assert!(cli.suggestion.is_some());
    }

    #[test]
    fn select_errors_keep_their_code() {
        let err = anyhow::Error::new(SelectError::RootNotFound("zz".into()));
        assert_eq!(CliError::from(&err).error_code.as_deref(), Some("E2001"));
    }

    #[test]
    fn coded_context_wins() {
        use anyhow::Context;
        let err = std::fs::read("/definitely/not/here.sqlite3")
            .context(Coded(ErrorCode::ExportDatabaseFailed))
            .unwrap_err();
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E4001"));
        assert!(cli.message.starts_with("Dependency export database failed"));
    }

    #[test]
    fn batch_errors_are_render_failures() {
        let err = anyhow::Error::new(BatchError { failed: 2, total: 9 });
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E5001"));
        assert_eq!(cli.message, "2 of 9 pages failed to render");
    }

    #[test]
    fn unknown_errors_are_internal() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(CliError::from(&err).error_code.as_deref(), Some("E9001"));
    }

    #[test]
    fn error_text_and_json() {
        let error = CliError::with_code("root missing", ErrorCode::RootNotFound);
        let mut text = Vec::new();
        write_error(&mut text, OutputMode::Text, &error).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("error[E2001]: root missing"));
        assert!(text.contains("suggestion:"));

        let mut json = Vec::new();
        write_error(&mut json, OutputMode::Json, &error).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["error"]["error_code"], "E2001");
    }
}
