//! Project identity and per-project facts.
//!
//! # Identity
//!
//! A [`ProjectId`] is a normalized, case-insensitive, path-like identifier:
//! backslashes become `/`, `.` and `..` segments are folded lexically, and the
//! whole string is lowercased. Because the stored form is already lowercase,
//! the derived `Ord` is the case-insensitive lexicographic order used for
//! every deterministic iteration in the engine.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Normalized project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Normalize an arbitrary path-like string into an identifier.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(normalize_identifier(raw))
    }

    /// Normalize a filesystem path into an identifier.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self::new(&path.to_string_lossy())
    }

    /// The normalized identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment (the project file name), lowercased.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Human-readable name derived from the file name.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(self.file_name())
    }

    /// Case-insensitive substring test used by fuzzy root lookup.
    #[must_use]
    pub fn matches_fragment(&self, fragment: &str) -> bool {
        let needle = fragment.replace('\\', "/").to_lowercase();
        !needle.is_empty() && self.0.contains(&needle)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Fold separators and dot segments, then lowercase.
#[must_use]
pub fn normalize_identifier(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}").to_lowercase()
    } else {
        joined.to_lowercase()
    }
}

/// Display name for a project or solution file name.
///
/// `.vcxproj`, `.sln` and `.slnf` extensions are stripped; managed project
/// files (`.csproj`, `.vbproj`) keep their full name.
#[must_use]
pub fn display_name(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".csproj") || lower.ends_with(".vbproj") {
        return file_name.to_string();
    }
    for ext in [".vcxproj", ".slnf", ".sln"] {
        if lower.ends_with(ext) {
            return file_name[..file_name.len() - ext.len()].to_string();
        }
    }
    file_name.to_string()
}

/// Timing facts attached to a project after correlation with a build log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Build sequence number (`N>` prefix in the log).
    pub sequence: u32,
    /// Total project build duration in milliseconds.
    pub duration_ms: u64,
    /// Compile-phase duration, when the log reports one.
    pub compile_ms: Option<u64>,
    /// Link-phase duration, when the log reports one.
    pub link_ms: Option<u64>,
    /// Raw "unused libraries" diagnostic text for this build.
    pub unused_refs: Option<String>,
}

impl BuildInfo {
    /// Duration formatted as `MM:SS`.
    #[must_use]
    pub fn duration_display(&self) -> String {
        let total_secs = self.duration_ms / 1000;
        format!("{:02}:{:02}", (total_secs / 60) % 60, total_secs % 60)
    }
}

/// One project in the reference graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    /// Path as discovered on disk (original casing).
    pub path: PathBuf,
    /// Discovered only as someone's reference, never as a scan target.
    pub is_external: bool,
    /// Output artifact file names (directory-stripped).
    pub outputs: BTreeSet<String>,
    pub build: Option<BuildInfo>,
}

impl Project {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, is_external: bool) -> Self {
        let path = path.into();
        Self {
            id: ProjectId::from_path(&path),
            path,
            is_external,
            outputs: BTreeSet::new(),
            build: None,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        self.id.display_name()
    }

    /// Path relative to `root` with `/` separators, falling back to the id.
    #[must_use]
    pub fn relative_path(&self, root: Option<&Path>) -> String {
        root.and_then(|root| self.path.strip_prefix(root).ok())
            .map_or_else(
                || self.id.to_string(),
                |rel| rel.to_string_lossy().replace('\\', "/"),
            )
    }
}
