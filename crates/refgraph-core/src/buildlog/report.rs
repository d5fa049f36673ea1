//! Timing reports derived from a parsed build log.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::{BuildEntry, BuildLog};

/// File name of the per-project timing table.
pub const BUILD_TIMES_FILE: &str = "build_times.csv";

const CSV_HEADER: &str = "project,total_build_time,compile_time,link_time";

/// One row per project. A project built more than once keeps its last build.
#[must_use]
pub fn build_times_csv(log: &BuildLog) -> String {
    let mut rows: BTreeMap<&str, &BuildEntry> = BTreeMap::new();
    for entry in log.builds().values() {
        rows.insert(entry.project.as_str(), entry);
    }

    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for entry in rows.values() {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            csv_field(&entry.project),
            entry.duration_ms,
            optional(entry.compile_ms),
            optional(entry.link_ms),
        );
    }
    out
}

/// Write [`build_times_csv`] to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_build_times(log: &BuildLog, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report directory {}", parent.display()))?;
    }
    std::fs::write(path, build_times_csv(log))
        .with_context(|| format!("write {}", path.display()))
}

/// HTML detail page for one build number, when the log has a summary for it.
///
/// The target summary sits beside the build's unused-library block.
#[must_use]
pub fn build_page(log: &BuildLog, sequence: u32) -> Option<String> {
    let summary = log.summary(sequence)?;
    let page = match log.unused_text(sequence) {
        Some(unused) => {
            let divider = "\t\t<br>".repeat(unused.matches('\n').count());
            format!(
                "<table><tr><td><pre>{}</pre></td><td valign=\"top\"><pre>{divider}</pre></td><td valign=\"top\"><pre>{}</pre></td></tr></table>",
                escape_html(summary),
                escape_html(unused),
            )
        }
        None => format!("<pre>{}</pre>", escape_html(summary)),
    };
    Some(page)
}

/// Path of the detail page for `sequence` under `dir`.
#[must_use]
pub fn build_page_path(dir: &Path, sequence: u32) -> PathBuf {
    dir.join(format!("build_{sequence}.html"))
}

/// Write every build detail page into `dir`. Returns the number written.
///
/// # Errors
///
/// Returns an error if the directory or a page cannot be written.
pub fn write_build_pages(log: &BuildLog, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create build page directory {}", dir.display()))?;

    let mut written = 0;
    for sequence in log.summary_sequences() {
        let Some(page) = build_page(log, sequence) else {
            continue;
        };
        let path = build_page_path(dir, sequence);
        std::fs::write(&path, page).with_context(|| format!("write {}", path.display()))?;
        written += 1;
    }
    debug!(pages = written, dir = %dir.display(), "wrote build detail pages");
    Ok(written)
}

/// Minimal escaping for text placed inside HTML element content.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn optional(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buildlog::tests::SAMPLE_LOG;

    fn sample() -> BuildLog {
        BuildLog::parse(SAMPLE_LOG.as_bytes()).expect("parse")
    }

    #[test]
    fn csv_has_header_and_one_row_per_project() {
        let csv = build_times_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&r"C:\src\Base\Base.vcxproj,1650,1200,300"));
        assert!(lines.contains(&r"C:\src\App\App.vcxproj,900,700,"));
    }

    #[test]
    fn csv_fields_with_commas_are_quoted() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }

    #[test]
    fn page_places_unused_libraries_beside_summary() {
        let page = build_page(&sample(), 2).expect("page");
        assert!(page.starts_with("<table>"));
        assert!(page.contains("Base.lib"));
        assert!(page.contains("2&gt;"));
    }

    #[test]
    fn pages_are_written_per_build_number() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("build");
        let written = write_build_pages(&sample(), &out).expect("write");
        assert_eq!(written, 2);
        assert!(build_page_path(&out, 1).exists());
        assert!(build_page_path(&out, 2).exists());
    }

    #[test]
    fn build_times_file_is_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(BUILD_TIMES_FILE);
        write_build_times(&sample(), &path).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.starts_with(CSV_HEADER));
    }
}
