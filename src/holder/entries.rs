use crate::ids::EntryId;

/// Posting list of one term
///
/// Appended in arbitrary order while indexing; `compile` sorts and deduplicates
/// so cursors can rely on strictly ascending ids.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Entries {
    ids: Vec<EntryId>,
}

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: EntryId) {
        self.ids.push(id);
    }

    pub fn compile(&mut self) {
        self.ids.sort_unstable();
        self.ids.dedup();
        self.ids.shrink_to_fit();
    }

    pub fn as_slice(&self) -> &[EntryId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<EntryId> for Entries {
    fn from_iter<I: IntoIterator<Item = EntryId>>(iter: I) -> Self {
        let mut entries = Self {
            ids: iter.into_iter().collect(),
        };
        entries.compile();
        entries
    }
}
