//! Build-timing correlation.
//!
//! Timing facts name projects the way the build tool printed them, which is
//! not always the path the scan found. A fact is matched, case-insensitively,
//! by the first rule that yields any candidate:
//!
//! 1. its normalized name equals a project identifier,
//! 2. its file name equals a project's file name,
//! 3. its file name equals one of a project's output artifacts.
//!
//! Several candidates resolve to the lowest identifier. A fact with no
//! candidate is dropped and counted.

use std::collections::{BTreeMap, BTreeSet};

use refgraph_core::buildlog::BuildFact;
use refgraph_core::project::{BuildInfo, Project, ProjectId};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::graph::index::ReferenceIndex;

/// Decides whether a reference edge is declared but unused.
pub trait UnusedReferenceMatcher: Send + Sync {
    /// `dependent` references `dependency`; is that reference unused?
    fn is_unused(&self, dependency: &Project, dependent: &Project) -> bool;
}

/// Flags an edge when any output artifact of the dependency appears in the
/// dependent's unused-library text as a path's file name: the match must
/// start the text or follow a path separator or whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl UnusedReferenceMatcher for SubstringMatcher {
    fn is_unused(&self, dependency: &Project, dependent: &Project) -> bool {
        let Some(text) = dependent
            .build
            .as_ref()
            .and_then(|build| build.unused_refs.as_deref())
        else {
            return false;
        };
        let text = text.to_lowercase();
        dependency
            .outputs
            .iter()
            .any(|output| names_file(&text, &output.to_lowercase()))
    }
}

fn names_file(text: &str, file: &str) -> bool {
    !file.is_empty()
        && text.match_indices(file).any(|(at, _)| {
            text[..at]
                .chars()
                .next_back()
                .is_none_or(|c| c == '\\' || c == '/' || c.is_whitespace())
        })
}

/// Outcome of one correlation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimingReport {
    pub attached: usize,
    /// Names of facts that matched no project.
    pub unmatched: Vec<String>,
    /// Facts that matched several projects, with the candidates.
    pub ambiguous: Vec<(String, Vec<ProjectId>)>,
    /// Largest duration among attached facts.
    pub max_duration_ms: u64,
}

/// Lookup tables for matching facts against the projects of an index.
pub struct TimingCorrelator<'a> {
    index: &'a ReferenceIndex,
    by_file_name: BTreeMap<String, BTreeSet<ProjectId>>,
    by_output: BTreeMap<String, BTreeSet<ProjectId>>,
}

impl<'a> TimingCorrelator<'a> {
    #[must_use]
    pub fn new(index: &'a ReferenceIndex) -> Self {
        let mut by_file_name: BTreeMap<String, BTreeSet<ProjectId>> = BTreeMap::new();
        let mut by_output: BTreeMap<String, BTreeSet<ProjectId>> = BTreeMap::new();
        for project in index.projects() {
            by_file_name
                .entry(project.id.file_name().to_string())
                .or_default()
                .insert(project.id.clone());
            for output in &project.outputs {
                by_output
                    .entry(output.to_lowercase())
                    .or_default()
                    .insert(project.id.clone());
            }
        }
        Self {
            index,
            by_file_name,
            by_output,
        }
    }

    /// Candidates for one fact name, from the first rule that has any.
    #[must_use]
    pub fn candidates(&self, name: &str) -> Vec<ProjectId> {
        let id = ProjectId::new(name);
        if self.index.contains(&id) {
            return vec![id];
        }
        let file_name = id.file_name();
        [&self.by_file_name, &self.by_output]
            .into_iter()
            .find_map(|table| table.get(file_name))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Match every fact. Later facts for the same project replace earlier
    /// ones.
    #[instrument(skip_all, fields(facts = facts.len()))]
    pub fn correlate(&self, facts: &[BuildFact]) -> (BTreeMap<ProjectId, BuildInfo>, TimingReport) {
        let mut matched: BTreeMap<ProjectId, BuildInfo> = BTreeMap::new();
        let mut report = TimingReport::default();

        for fact in facts {
            let candidates = self.candidates(&fact.name);
            let Some(target) = candidates.first().cloned() else {
                warn!(name = %fact.name, sequence = fact.sequence, "timing fact matches no project");
                report.unmatched.push(fact.name.clone());
                continue;
            };
            if candidates.len() > 1 {
                warn!(
                    name = %fact.name,
                    chosen = %target,
                    candidates = candidates.len(),
                    "timing fact matches several projects; using the lowest identifier"
                );
                report.ambiguous.push((fact.name.clone(), candidates));
            }

            report.max_duration_ms = report.max_duration_ms.max(fact.duration_ms);
            let info = BuildInfo {
                sequence: fact.sequence,
                duration_ms: fact.duration_ms,
                compile_ms: fact.compile_ms,
                link_ms: fact.link_ms,
                unused_refs: fact.unused_refs.clone().filter(|text| !text.is_empty()),
            };
            if matched.insert(target.clone(), info).is_some() {
                debug!(project = %target, "later timing fact replaces earlier one");
            }
        }

        report.attached = matched.len();
        info!(
            attached = report.attached,
            unmatched = report.unmatched.len(),
            ambiguous = report.ambiguous.len(),
            "correlated build timings"
        );
        (matched, report)
    }
}

/// Correlate `facts` and store the results on the index's projects.
pub fn attach(index: &mut ReferenceIndex, facts: &[BuildFact]) -> TimingReport {
    let (matched, report) = TimingCorrelator::new(index).correlate(facts);
    for (id, info) in matched {
        if let Some(project) = index.project_mut(&id) {
            project.build = Some(info);
        }
    }
    report
}
