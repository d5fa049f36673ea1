//! Solution (`.sln`) and solution filter (`.slnf`) parsing.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{ScanError, clean_path};

/// `Project("{type-guid}") = "Name", "relative\path.vcxproj", "{guid}"`
static PROJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^Project\("[^"]*"\)\s*=\s*"[^"]*"\s*,\s*"([^"]+\.vcxproj)""#)
        .expect("solution project pattern is valid")
});

/// Relative `.vcxproj` paths declared in solution text, in file order.
///
/// Parsing stops at the `Global` section, which ends the project list.
#[must_use]
pub fn parse_solution(text: &str) -> Vec<String> {
    let mut projects = Vec::new();
    for line in text.lines() {
        if line.trim_end() == "Global" {
            break;
        }
        if let Some(caps) = PROJECT_LINE.captures(line.trim_start()) {
            projects.push(caps[1].to_string());
        }
    }
    projects
}

/// Absolute project paths of a solution file.
///
/// # Errors
///
/// Returns [`ScanError::Unreadable`] if the solution cannot be read.
pub fn solution_projects(sln: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let text = read_text(sln)?;
    let dir = sln.parent().unwrap_or_else(|| Path::new(""));
    Ok(parse_solution(&text)
        .iter()
        .map(|rel| resolve_relative(dir, rel))
        .collect())
}

#[derive(Debug, Deserialize)]
struct SolutionFilter {
    solution: FilterBody,
}

#[derive(Debug, Deserialize)]
struct FilterBody {
    path: String,
    #[serde(default)]
    projects: Vec<String>,
}

/// The referenced solution and the absolute `.vcxproj` paths of a filter.
///
/// Filter project paths are relative to the referenced solution's directory,
/// which is itself relative to the filter file.
///
/// # Errors
///
/// Returns an error if the filter cannot be read or is not valid JSON.
pub fn filter_projects(slnf: &Path) -> Result<(PathBuf, Vec<PathBuf>), ScanError> {
    let text = read_text(slnf)?;
    let filter: SolutionFilter =
        serde_json::from_str(&text).map_err(|source| ScanError::InvalidSolutionFilter {
            path: slnf.to_path_buf(),
            source,
        })?;

    let filter_dir = slnf.parent().unwrap_or_else(|| Path::new(""));
    let solution = resolve_relative(filter_dir, &filter.solution.path);
    let solution_dir = solution.parent().unwrap_or_else(|| Path::new("")).to_path_buf();

    let projects = filter
        .solution
        .projects
        .iter()
        .filter(|rel| rel.to_lowercase().ends_with(".vcxproj"))
        .map(|rel| resolve_relative(&solution_dir, rel))
        .collect();
    Ok((solution, projects))
}

/// Join a Windows- or Unix-style relative path onto `base`.
pub(crate) fn resolve_relative(base: &Path, rel: &str) -> PathBuf {
    clean_path(&base.join(rel.replace('\\', "/")))
}

fn read_text(path: &Path) -> Result<String, ScanError> {
    std::fs::read_to_string(path).map_err(|source| ScanError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}
