use std::collections::HashMap;

use super::value_parser::Term;
use crate::error::{IndexerError, Result};
use crate::ids::MAX_VALUE_ID;

/// Dense term -> value-id assignment for one holder
///
/// Ids are handed out at commit time only; query-time lookups never allocate, so
/// a term never seen while indexing has no id and matches nothing.
#[derive(Debug, Default, Clone)]
pub struct ValueDictionary {
    ids: HashMap<Term, u64>,
    next_id: u64,
}

impl ValueDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `term`, allocating the next one if unseen
    pub fn intern(&mut self, term: &Term) -> Result<u64> {
        if let Some(&id) = self.ids.get(term) {
            return Ok(id);
        }
        let id = self.next_id;
        if id > MAX_VALUE_ID {
            return Err(IndexerError::ValueIdOverflow(id));
        }
        self.ids.insert(term.clone(), id);
        self.next_id += 1;
        Ok(id)
    }

    pub fn lookup(&self, term: &Term) -> Option<u64> {
        self.ids.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn with_next_id(next_id: u64) -> Self {
        Self {
            ids: HashMap::new(),
            next_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_lookup() {
        let mut dict = ValueDictionary::new();
        let a = dict.intern(&Term::Str("a".to_string())).unwrap();
        let b = dict.intern(&Term::Int(5)).unwrap();

        assert_ne!(a, b);
        assert_eq!(dict.intern(&Term::Str("a".to_string())).unwrap(), a);
        assert_eq!(dict.lookup(&Term::Int(5)), Some(b));
        assert_eq!(dict.lookup(&Term::Int(6)), None);
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_value_id_overflow() {
        let mut dict = ValueDictionary::with_next_id(MAX_VALUE_ID);
        assert_eq!(dict.intern(&Term::Int(1)).unwrap(), MAX_VALUE_ID);
        assert!(matches!(
            dict.intern(&Term::Int(2)),
            Err(IndexerError::ValueIdOverflow(_))
        ));
    }
}
