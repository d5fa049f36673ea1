//! Project metadata discovery.
//!
//! # Overview
//!
//! A scan starts from a solution (`.sln`), a solution filter (`.slnf`) or a
//! directory searched recursively for `*.vcxproj`. Every project found that
//! way is a *primary* project. Each primary project is read through a
//! [`MetadataReader`] for its ordered project references and its output
//! artifact names.
//!
//! Referenced projects that are not primary become *external* projects. They
//! are read best-effort for their own references, restricted to projects the
//! scan already knows about. A reference whose file does not exist is not an
//! error: it simply has no further references.

pub mod msbuild;
pub mod solution;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::error::ErrorCode;
use crate::project::{Project, ProjectId};

pub use msbuild::MsBuildReader;

/// Errors raised while locating or reading scan inputs.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("path not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid solution filter {}: {source}", .path.display())]
    InvalidSolutionFilter {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ScanError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InputNotFound(_) => ErrorCode::InputNotFound,
            Self::Unreadable { .. } | Self::InvalidSolutionFilter { .. } => {
                ErrorCode::InternalUnexpected
            }
        }
    }

    /// `true` when the underlying cause is a missing file.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::InputNotFound(_) => true,
            Self::Unreadable { source, .. } => source.kind() == io::ErrorKind::NotFound,
            Self::InvalidSolutionFilter { .. } => false,
        }
    }
}

/// References and outputs declared by one project file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Referenced project paths, in declaration order.
    pub references: Vec<PathBuf>,
    /// Output artifact file names (macro-expanded, directory-stripped).
    pub outputs: BTreeSet<String>,
}

/// Reads the metadata of one project file.
pub trait MetadataReader {
    /// # Errors
    ///
    /// Returns an error if the project file cannot be read.
    fn read(&self, project: &Path) -> Result<ProjectMetadata, ScanError>;
}

/// Where a scan starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    Solution {
        file: PathBuf,
    },
    SolutionFilter {
        file: PathBuf,
        /// Solution the filter points at.
        solution: PathBuf,
        projects: Vec<PathBuf>,
    },
    Directory {
        dir: PathBuf,
    },
}

impl ScanTarget {
    /// Classify an input path. Solution filters are parsed here.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InputNotFound`] if the path does not exist, or a
    /// read/parse error for an unreadable solution filter.
    pub fn resolve(input: &Path) -> Result<Self, ScanError> {
        let absolute = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
        if !absolute.exists() {
            return Err(ScanError::InputNotFound(absolute));
        }

        let ext = absolute
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        match ext.as_deref() {
            Some("sln") if absolute.is_file() => Ok(Self::Solution { file: absolute }),
            Some("slnf") if absolute.is_file() => {
                let (solution, projects) = solution::filter_projects(&absolute)?;
                Ok(Self::SolutionFilter {
                    file: absolute,
                    solution,
                    projects,
                })
            }
            _ => Ok(Self::Directory {
                dir: clean_path(&absolute),
            }),
        }
    }

    /// File name of the solution or filter, if any.
    #[must_use]
    pub fn solution_name(&self) -> Option<String> {
        match self {
            Self::Solution { file } | Self::SolutionFilter { file, .. } => {
                file.file_name().map(|name| name.to_string_lossy().into_owned())
            }
            Self::Directory { .. } => None,
        }
    }

    /// Directory that relative paths and `$(SolutionDir)` resolve against.
    #[must_use]
    pub fn root_dir(&self) -> PathBuf {
        match self {
            Self::Solution { file } => parent_dir(file),
            Self::SolutionFilter { solution, .. } => parent_dir(solution),
            Self::Directory { dir } => dir.clone(),
        }
    }

    fn primary_projects(&self) -> Result<Vec<PathBuf>, ScanError> {
        match self {
            Self::Solution { file } => solution::solution_projects(file),
            Self::SolutionFilter { projects, .. } => Ok(projects.clone()),
            Self::Directory { dir } => Ok(directory_projects(dir)),
        }
    }
}

/// One project as discovered by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedProject {
    pub project: Project,
    /// Referenced identifiers, deduplicated, in declaration order.
    pub references: Vec<ProjectId>,
}

/// The result of scanning a solution or directory.
#[derive(Debug, Clone)]
pub struct Scan {
    /// Directory relative paths and `$(SolutionDir)` resolve against.
    pub root: PathBuf,
    /// Solution or filter file name, when the scan started from one.
    pub solution_name: Option<String>,
    pub projects: BTreeMap<ProjectId, ScannedProject>,
}

impl Scan {
    /// Number of primary (non-external) projects.
    #[must_use]
    pub fn primary_count(&self) -> usize {
        self.projects
            .values()
            .filter(|p| !p.project.is_external)
            .count()
    }
}

/// Scan `input` with the default MSBuild reader.
///
/// # Errors
///
/// Returns an error if the input does not exist or its solution file cannot
/// be read. Unreadable project files are not errors.
pub fn scan(input: &Path) -> Result<Scan, ScanError> {
    let target = ScanTarget::resolve(input)?;
    let reader = MsBuildReader::new(&target.root_dir());
    scan_with(&target, &reader)
}

/// Scan a resolved target through an arbitrary reader.
///
/// # Errors
///
/// Returns an error if the solution or filter file cannot be read.
#[instrument(skip(reader))]
pub fn scan_with(target: &ScanTarget, reader: &dyn MetadataReader) -> Result<Scan, ScanError> {
    let primary_paths = target.primary_projects()?;
    let root = target.root_dir();
    info!(
        projects = primary_paths.len(),
        root = %root.display(),
        "collected project paths"
    );

    let mut projects: BTreeMap<ProjectId, ScannedProject> = BTreeMap::new();
    let mut pending_external: BTreeMap<ProjectId, PathBuf> = BTreeMap::new();

    for path in primary_paths {
        let mut project = Project::new(clean_path(&path), false);
        if projects.contains_key(&project.id) {
            continue;
        }
        let metadata = read_best_effort(reader, &project.path);
        project.outputs = metadata.outputs;

        let references = dedup_references(&metadata.references, |id, path| {
            pending_external.entry(id).or_insert(path);
        });
        projects.insert(project.id.clone(), ScannedProject { project, references });
    }

    pending_external.retain(|id, _| !projects.contains_key(id));
    let known: HashSet<ProjectId> = projects
        .keys()
        .chain(pending_external.keys())
        .cloned()
        .collect();

    for (id, path) in pending_external {
        let mut project = Project::new(path, true);
        project.id = id.clone();
        let metadata = read_best_effort(reader, &project.path);
        project.outputs = metadata.outputs;

        let mut references = dedup_references(&metadata.references, |_, _| {});
        references.retain(|reference| known.contains(reference));
        projects.insert(id, ScannedProject { project, references });
    }

    Ok(Scan {
        root,
        solution_name: target.solution_name(),
        projects,
    })
}

fn parent_dir(file: &Path) -> PathBuf {
    file.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Every `*.vcxproj` below `dir`, sorted for determinism.
fn directory_projects(dir: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("vcxproj"))
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    found.sort();
    found
}

fn read_best_effort(reader: &dyn MetadataReader, path: &Path) -> ProjectMetadata {
    match reader.read(path) {
        Ok(metadata) => metadata,
        Err(err) if err.is_missing() => {
            debug!(path = %path.display(), "project file missing; treating as leaf");
            ProjectMetadata::default()
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "project file unreadable; treating as leaf");
            ProjectMetadata::default()
        }
    }
}

fn dedup_references(
    references: &[PathBuf],
    mut on_new: impl FnMut(ProjectId, PathBuf),
) -> Vec<ProjectId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(references.len());
    for path in references {
        let cleaned = clean_path(path);
        let id = ProjectId::from_path(&cleaned);
        if seen.insert(id.clone()) {
            on_new(id.clone(), cleaned);
            ids.push(id);
        }
    }
    ids
}

/// Lexically fold `.` and `..` components without touching the filesystem.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
