//! MSBuild project file (`.vcxproj`) reader.
//!
//! Only two facts are extracted from a project file:
//!
//! - `ProjectReference Include="..."` paths, in declaration order.
//!   `$(SolutionDir)` expands to the scan root; any other path is relative to
//!   the project's own directory.
//! - `OutputFile` and `ImportLibrary` values, reduced to file names. Directory
//!   macros are dropped and name macros are expanded from the project's own
//!   properties.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::solution::resolve_relative;
use super::{MetadataReader, ProjectMetadata, ScanError};

static PROJECT_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<ProjectReference\b[^>]*?\bInclude\s*=\s*"([^"]*)""#)
        .expect("project reference pattern is valid")
});

static ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)<(OutputFile|ImportLibrary|TargetName|ProjectName|TargetFileName|RootNamespace)(?:\s[^>]*)?>(.*?)</(?:OutputFile|ImportLibrary|TargetName|ProjectName|TargetFileName|RootNamespace)>",
    )
    .expect("element pattern is valid")
});

/// Macros that only contribute directories or extensions to an output path.
const IGNORED_MACROS: [&str; 7] = [
    "$(OutDir)",
    "$(IntermediateOutputPath)",
    "$(ProjectDir)",
    "$(TargetExt)",
    "$(IntDir)",
    "$(TargetDir)",
    "$(TargetPath)",
];

/// Macros expanded from the project's own properties.
const EVAL_MACROS: [(&str, &str); 4] = [
    ("$(TargetName)", "TargetName"),
    ("$(ProjectName)", "ProjectName"),
    ("$(TargetFileName)", "TargetFileName"),
    ("$(RootNamespace)", "RootNamespace"),
];

const SOLUTION_DIR: &str = "$(SolutionDir)";

/// Reads `.vcxproj` files from disk.
#[derive(Debug, Clone)]
pub struct MsBuildReader {
    solution_dir: PathBuf,
}

impl MsBuildReader {
    #[must_use]
    pub fn new(solution_dir: &Path) -> Self {
        Self {
            solution_dir: solution_dir.to_path_buf(),
        }
    }
}

impl MetadataReader for MsBuildReader {
    fn read(&self, project: &Path) -> Result<ProjectMetadata, ScanError> {
        let text = std::fs::read_to_string(project).map_err(|source| ScanError::Unreadable {
            path: project.to_path_buf(),
            source,
        })?;
        Ok(parse_project(&text, project, &self.solution_dir))
    }
}

/// Extract references and outputs from project file text.
#[must_use]
pub fn parse_project(text: &str, project: &Path, solution_dir: &Path) -> ProjectMetadata {
    let project_dir = project.parent().unwrap_or_else(|| Path::new(""));

    let references = PROJECT_REFERENCE
        .captures_iter(text)
        .map(|caps| unescape(&caps[1]))
        .filter(|include| !include.trim().is_empty())
        .map(|include| {
            if let Some(rest) = include.strip_prefix(SOLUTION_DIR) {
                resolve_relative(solution_dir, rest)
            } else {
                resolve_relative(project_dir, &include)
            }
        })
        .collect();

    let mut raw_outputs = Vec::new();
    let mut properties: HashMap<&str, String> = HashMap::new();
    for caps in ELEMENT.captures_iter(text) {
        let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let value = unescape(value.as_str().trim());
        match name.as_str() {
            "OutputFile" | "ImportLibrary" => raw_outputs.push(value),
            other => {
                properties.entry(property_key(other)).or_insert(value);
            }
        }
    }

    let properties = Properties::with_defaults(properties, project);
    let outputs = raw_outputs
        .iter()
        .filter_map(|raw| output_file_name(raw, &properties))
        .collect::<BTreeSet<_>>();

    ProjectMetadata {
        references,
        outputs,
    }
}

fn property_key(name: &str) -> &'static str {
    match name {
        "TargetName" => "TargetName",
        "ProjectName" => "ProjectName",
        "TargetFileName" => "TargetFileName",
        _ => "RootNamespace",
    }
}

/// Project properties with MSBuild's naming defaults applied.
struct Properties {
    values: HashMap<&'static str, String>,
}

impl Properties {
    fn with_defaults(mut values: HashMap<&'static str, String>, project: &Path) -> Self {
        let stem = project
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let project_name = values.entry("ProjectName").or_insert(stem).clone();
        let target_name = values.entry("TargetName").or_insert(project_name).clone();
        values.entry("TargetFileName").or_insert(target_name);
        Self { values }
    }

    fn get(&self, key: &str) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }
}

fn output_file_name(raw: &str, properties: &Properties) -> Option<String> {
    let mut text = raw.to_string();
    for mac in IGNORED_MACROS {
        text = text.replace(mac, "");
    }
    for (mac, key) in EVAL_MACROS {
        if text.contains(mac) {
            text = text.replace(mac, properties.get(key));
        }
    }

    let name = text.rsplit(['\\', '/']).next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
