use crate::holder::TermRef;
use crate::ids::EntryId;

/// Remaining spans longer than this are searched with binary search
const LINEAR_SCAN_LIMIT: usize = 8;

/// Forward-only position over one sorted posting list
#[derive(Debug, Clone)]
pub struct EntriesCursor<'a> {
    term: TermRef,
    entries: &'a [EntryId],
    pos: usize,
}

impl<'a> EntriesCursor<'a> {
    pub fn new(term: TermRef, entries: &'a [EntryId]) -> Self {
        Self {
            term,
            entries,
            pos: 0,
        }
    }

    /// Current entry, [`EntryId::NULL`] once exhausted
    pub fn current(&self) -> EntryId {
        self.entries.get(self.pos).copied().unwrap_or(EntryId::NULL)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.entries.len()
    }

    /// Advance to the first entry `>= id`
    pub fn skip_to(&mut self, id: EntryId) -> EntryId {
        self.advance_while(|e| e < id);
        self.current()
    }

    /// Advance to the first entry `> id`
    pub fn skip_past(&mut self, id: EntryId) -> EntryId {
        self.advance_while(|e| e <= id);
        self.current()
    }

    fn advance_while(&mut self, before: impl Fn(EntryId) -> bool) {
        let rest = &self.entries[self.pos.min(self.entries.len())..];
        if rest.len() > LINEAR_SCAN_LIMIT {
            self.pos += rest.partition_point(|&e| before(e));
            return;
        }
        while self.pos < self.entries.len() && before(self.entries[self.pos]) {
            self.pos += 1;
        }
    }

    pub fn term(&self) -> TermRef {
        self.term
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ConjunctionId;

    fn ids(docs: &[u32]) -> Vec<EntryId> {
        docs.iter()
            .map(|&d| EntryId::new(ConjunctionId::new(d, 0, 1).unwrap(), true))
            .collect()
    }

    fn id(doc: u32) -> EntryId {
        EntryId::new(ConjunctionId::new(doc, 0, 1).unwrap(), true)
    }

    #[test]
    fn test_skip_short_list() {
        let entries = ids(&[1, 3, 5]);
        let mut cursor = EntriesCursor::new(TermRef::Wildcard, &entries);

        assert_eq!(cursor.current(), id(1));
        assert_eq!(cursor.skip_to(id(3)), id(3));
        assert_eq!(cursor.skip_to(id(2)), id(3));
        assert_eq!(cursor.skip_past(id(3)), id(5));
        assert!(cursor.skip_past(id(5)).is_null());
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn test_skip_long_list_uses_same_semantics() {
        let docs: Vec<u32> = (0..100).map(|d| d * 2).collect();
        let entries = ids(&docs);
        let mut cursor = EntriesCursor::new(TermRef::Wildcard, &entries);

        assert_eq!(cursor.skip_to(id(51)), id(52));
        assert_eq!(cursor.skip_to(id(52)), id(52));
        assert_eq!(cursor.skip_past(id(52)), id(54));
        assert_eq!(cursor.skip_to(id(197)), id(198));
        assert!(cursor.skip_to(EntryId::NULL).is_null());
    }

    #[test]
    fn test_exclude_sorts_before_include() {
        let conj = ConjunctionId::new(4, 0, 1).unwrap();
        let entries = vec![EntryId::new(conj, false), EntryId::new(conj, true)];
        let mut cursor = EntriesCursor::new(TermRef::Wildcard, &entries);

        assert_eq!(cursor.skip_to(EntryId::new(conj, false)), EntryId::new(conj, false));
        assert_eq!(
            cursor.skip_past(EntryId::new(conj, false)),
            EntryId::new(conj, true)
        );
    }
}
