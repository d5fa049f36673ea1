//! Stable per-run integer aliases.
//!
//! One ascending pass over the sorted identifiers assigns 0, 1, 2, ... so the
//! same project set always produces the same aliases. Aliases key rendered
//! nodes and name per-project pages.

use std::collections::BTreeMap;

use refgraph_core::project::ProjectId;

#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_id: BTreeMap<ProjectId, u32>,
    by_alias: Vec<ProjectId>,
}

impl AliasTable {
    /// Assign aliases in identifier order. Duplicates are ignored.
    #[must_use]
    pub fn new<'a>(ids: impl IntoIterator<Item = &'a ProjectId>) -> Self {
        let mut sorted: Vec<&ProjectId> = ids.into_iter().collect();
        sorted.sort_unstable();
        sorted.dedup();

        let mut table = Self::default();
        for (alias, id) in (0u32..).zip(sorted) {
            table.by_id.insert(id.clone(), alias);
            table.by_alias.push(id.clone());
        }
        table
    }

    #[must_use]
    pub fn alias_of(&self, id: &ProjectId) -> Option<u32> {
        self.by_id.get(id).copied()
    }

    #[must_use]
    pub fn project_of(&self, alias: u32) -> Option<&ProjectId> {
        usize::try_from(alias).ok().and_then(|i| self.by_alias.get(i))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_follow_identifier_order() {
        let ids = [ProjectId::new("zeta"), ProjectId::new("Alpha"), ProjectId::new("mid")];
        let table = AliasTable::new(&ids);
        assert_eq!(table.alias_of(&ProjectId::new("alpha")), Some(0));
        assert_eq!(table.alias_of(&ProjectId::new("mid")), Some(1));
        assert_eq!(table.alias_of(&ProjectId::new("zeta")), Some(2));
        assert_eq!(table.project_of(1), Some(&ProjectId::new("mid")));
        assert_eq!(table.project_of(3), None);
    }

    #[test]
    fn identical_input_yields_identical_aliases() {
        let ids = [ProjectId::new("b"), ProjectId::new("a")];
        let first = AliasTable::new(&ids);
        let second = AliasTable::new(ids.iter().rev());
        for id in &ids {
            assert_eq!(first.alias_of(id), second.alias_of(id));
        }
    }
}
