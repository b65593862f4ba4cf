use super::EntriesCursor;
use crate::holder::MatchedEntries;
use crate::ids::EntryId;

/// All cursors matched by one field's query values, read as a single merged stream
///
/// The scanner's current entry is the minimum over its cursors.
#[derive(Debug, Clone)]
pub struct FieldScanner<'a> {
    field: &'a str,
    cursors: Vec<EntriesCursor<'a>>,
    current: EntryId,
}

impl<'a> FieldScanner<'a> {
    pub fn new(field: &'a str, matched: Vec<MatchedEntries<'a>>) -> Self {
        let cursors = matched
            .into_iter()
            .filter(|m| !m.entries.is_empty())
            .map(|m| EntriesCursor::new(m.term, m.entries))
            .collect();
        let mut scanner = Self {
            field,
            cursors,
            current: EntryId::NULL,
        };
        scanner.refresh();
        scanner
    }

    pub fn field(&self) -> &'a str {
        self.field
    }

    pub fn current(&self) -> EntryId {
        self.current
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_null()
    }

    /// Move every cursor to its first entry `>= id`
    pub fn skip_to(&mut self, id: EntryId) -> EntryId {
        if self.current >= id {
            return self.current;
        }
        for cursor in &mut self.cursors {
            cursor.skip_to(id);
        }
        self.refresh()
    }

    /// Move every cursor past `id`
    pub fn skip_past(&mut self, id: EntryId) -> EntryId {
        if self.current > id {
            return self.current;
        }
        for cursor in &mut self.cursors {
            cursor.skip_past(id);
        }
        self.refresh()
    }

    pub fn cursors(&self) -> &[EntriesCursor<'a>] {
        &self.cursors
    }

    fn refresh(&mut self) -> EntryId {
        self.cursors.retain(|c| !c.is_exhausted());
        self.current = self
            .cursors
            .iter()
            .map(EntriesCursor::current)
            .min()
            .unwrap_or(EntryId::NULL);
        self.current
    }
}

/// Insertion sort by current entry; scanner sets are small and mostly ordered
pub fn sort_scanners(scanners: &mut [FieldScanner<'_>]) {
    for i in 1..scanners.len() {
        let mut j = i;
        while j > 0 && scanners[j - 1].current() > scanners[j].current() {
            scanners.swap(j - 1, j);
            j -= 1;
        }
    }
}
