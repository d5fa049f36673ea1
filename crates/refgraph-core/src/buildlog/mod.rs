//! MSBuild build-log parsing.
//!
//! The log must be in real-time order and carry the "Detailed" performance
//! summaries. Three kinds of sections are recognized, each prefixed with the
//! `N>` build number of the node that produced it:
//!
//! - `Project Performance Summary:` whose last timing line names the project
//!   file and its total build time.
//! - `Target Performance Summary:` which holds the per-target breakdown. The
//!   accumulated section text becomes the build's detail text, and the
//!   `ClCompile` and `Link` rows become the compile and link sub-durations.
//! - `Unused libraries:` and `Unused delay load specifications:` blocks,
//!   appended to the build's unused-reference text.
//!
//! A section ends at the first line that ends with `>` (an empty `N>` line)
//! or contains the reentrancy footnote.

pub mod report;

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::ErrorCode;

static PERFORMANCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)>\s*(\d+) ms\s*(.*\.vcxproj)").expect("performance pattern is valid")
});

static COMPILE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)>\s*(\d+) ms\s+ClCompile\b").expect("compile pattern is valid")
});

static LINK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)>\s*(\d+) ms\s+Link\b").expect("link pattern is valid")
});

const REENTRANCY_FOOTNOTE: &str = "(* = timing was not recorded because of reentrancy)";

/// Errors raised while reading a build log.
#[derive(Debug, thiserror::Error)]
pub enum BuildLogError {
    #[error("failed to read build log {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildLogError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::BuildLogUnreadable
    }
}

/// One project build found in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildEntry {
    pub sequence: u32,
    /// Project file path exactly as the log prints it.
    pub project: String,
    pub duration_ms: u64,
    pub compile_ms: Option<u64>,
    pub link_ms: Option<u64>,
}

/// A timing fact handed to the correlator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFact {
    pub sequence: u32,
    /// Project name or path as reported by the build tool.
    pub name: String,
    pub duration_ms: u64,
    pub compile_ms: Option<u64>,
    pub link_ms: Option<u64>,
    pub unused_refs: Option<String>,
}

/// Anything that can produce build timing facts.
pub trait TimingSource {
    fn facts(&self) -> Vec<BuildFact>;
}

/// Parsed contents of a build log.
#[derive(Debug, Clone, Default)]
pub struct BuildLog {
    builds: BTreeMap<u32, BuildEntry>,
    unused: BTreeMap<u32, String>,
    summaries: BTreeMap<u32, String>,
}

impl BuildLog {
    /// Parse a log from any buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if reading a line fails.
    pub fn parse<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut parser = Parser::default();
        for line in reader.lines() {
            parser.feed(&line?);
        }
        Ok(parser.log)
    }

    /// Parse the log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildLogError::Unreadable`] if the file cannot be opened or
    /// read.
    #[instrument]
    pub fn from_path(path: &Path) -> Result<Self, BuildLogError> {
        let unreadable = |source| BuildLogError::Unreadable {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path).map_err(unreadable)?;
        let log = Self::parse(BufReader::new(file)).map_err(unreadable)?;
        info!(
            builds = log.builds.len(),
            unused_blocks = log.unused.len(),
            "parsed build log"
        );
        Ok(log)
    }

    /// Builds keyed by build number.
    #[must_use]
    pub const fn builds(&self) -> &BTreeMap<u32, BuildEntry> {
        &self.builds
    }

    /// Unused-library text for one build number.
    #[must_use]
    pub fn unused_text(&self, sequence: u32) -> Option<&str> {
        self.unused.get(&sequence).map(String::as_str)
    }

    /// Target performance summary text for one build number.
    #[must_use]
    pub fn summary(&self, sequence: u32) -> Option<&str> {
        self.summaries.get(&sequence).map(String::as_str)
    }

    /// All build numbers that have a detail summary.
    pub fn summary_sequences(&self) -> impl Iterator<Item = u32> + '_ {
        self.summaries.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

impl TimingSource for BuildLog {
    fn facts(&self) -> Vec<BuildFact> {
        self.builds
            .values()
            .map(|entry| BuildFact {
                sequence: entry.sequence,
                name: entry.project.clone(),
                duration_ms: entry.duration_ms,
                compile_ms: entry.compile_ms,
                link_ms: entry.link_ms,
                unused_refs: self.unused.get(&entry.sequence).cloned(),
            })
            .collect()
    }
}

impl TimingSource for Vec<BuildFact> {
    fn facts(&self) -> Vec<BuildFact> {
        self.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Project,
    Target,
    Unused,
}

#[derive(Debug, Default)]
struct Parser {
    log: BuildLog,
    section: Option<Section>,
    /// Text accumulated since the last target or unused section closed.
    info: String,
    current: Option<u32>,
    last_line: String,
}

impl Parser {
    fn feed(&mut self, line: &str) {
        if line.ends_with("Project Performance Summary:") {
            self.section = Some(Section::Project);
        } else if line.ends_with("Target Performance Summary:") {
            self.section = Some(Section::Target);
        } else if line.ends_with("Unused libraries:")
            || line.ends_with("Unused delay load specifications:")
        {
            self.section = Some(Section::Unused);
            self.current = sequence_prefix(line);
        }

        if self.section.is_some() {
            self.info.push_str(line);
            self.info.push('\n');
        }

        let closes = line.ends_with('>') || line.contains(REENTRANCY_FOOTNOTE);
        match (self.section, closes) {
            (Some(Section::Project), true) => {
                self.section = None;
                self.close_project_summary();
            }
            (Some(Section::Target), true) => {
                self.section = None;
                self.close_target_summary();
            }
            (Some(Section::Unused), true) => {
                self.section = None;
                let text = std::mem::take(&mut self.info);
                if let Some(sequence) = self.current {
                    self.log.unused.entry(sequence).or_default().push_str(&text);
                }
            }
            (Some(Section::Project), false) => {
                line.clone_into(&mut self.last_line);
            }
            _ => {}
        }
    }

    /// The line before the closing line carries the project's total.
    fn close_project_summary(&mut self) {
        let Some(caps) = PERFORMANCE_LINE.captures(&self.last_line) else {
            debug!(line = %self.last_line, "project summary without a timing line");
            return;
        };
        let (Ok(sequence), Ok(duration_ms)) = (caps[1].parse::<u32>(), caps[2].parse::<u64>())
        else {
            return;
        };
        self.current = Some(sequence);
        self.log.builds.insert(
            sequence,
            BuildEntry {
                sequence,
                project: caps[3].trim().to_string(),
                duration_ms,
                compile_ms: None,
                link_ms: None,
            },
        );
    }

    fn close_target_summary(&mut self) {
        let text = std::mem::take(&mut self.info);
        let Some(sequence) = self.current else {
            return;
        };
        if let Some(entry) = self.log.builds.get_mut(&sequence) {
            entry.compile_ms = capture_ms(&COMPILE_LINE, &text);
            entry.link_ms = capture_ms(&LINK_LINE, &text);
        }
        self.log.summaries.insert(sequence, text);
    }
}

fn capture_ms(pattern: &Regex, text: &str) -> Option<u64> {
    pattern
        .captures(text)
        .and_then(|caps| caps[2].parse().ok())
}

fn sequence_prefix(line: &str) -> Option<u32> {
    let (prefix, _) = line.split_once('>')?;
    prefix.trim().parse().ok()
}
