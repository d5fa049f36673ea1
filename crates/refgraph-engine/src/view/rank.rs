//! Leaderboards.

use refgraph_core::project::{Project, ProjectId};
use serde::Serialize;

use crate::engine::DependencyGraph;

/// One ranked project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub id: ProjectId,
    pub value: u64,
}

/// A titled, ranked column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leaderboard {
    pub header: String,
    pub entries: Vec<RankEntry>,
}

impl DependencyGraph {
    /// Timed internal projects by build duration, longest first.
    #[must_use]
    pub fn rank_by_duration(&self, n: usize) -> Vec<RankEntry> {
        self.rank(n, |project| project.build.as_ref().map(|b| b.duration_ms))
    }

    /// Internal projects by number of minimal dependents, most first.
    #[must_use]
    pub fn rank_by_reference_count(&self, n: usize) -> Vec<RankEntry> {
        self.rank(n, |project| {
            Some(self.minimal_reverse_of(&project.id).len() as u64)
        })
    }

    /// Both boards; the duration board only when timing was attached.
    #[must_use]
    pub fn leaderboards(&self, n: usize) -> Vec<Leaderboard> {
        let mut boards = vec![Leaderboard {
            header: "Most References".to_string(),
            entries: self.rank_by_reference_count(n),
        }];
        if self.timing().attached > 0 {
            boards.push(Leaderboard {
                header: "Longest Build Time".to_string(),
                entries: self.rank_by_duration(n),
            });
        }
        boards
    }

    fn rank(&self, n: usize, value: impl Fn(&Project) -> Option<u64>) -> Vec<RankEntry> {
        let mut entries: Vec<RankEntry> = self
            .visible_projects(true)
            .filter_map(|project| {
                value(project).map(|value| RankEntry {
                    id: project.id.clone(),
                    value,
                })
            })
            .collect();
        // Stable sort keeps identifier order among equal values.
        entries.sort_by(|a, b| b.value.cmp(&a.value));
        entries.truncate(n);
        entries
    }
}
